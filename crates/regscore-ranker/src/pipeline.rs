//! End-to-end scoring run.
//!
//! validate → index → per-source counts and oracle queries (in parallel)
//! → ranked table. A failure anywhere aborts the run with no partial output.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use regscore_common::{RawTable, Result, ScoringConfig};

use crate::assemble::{ResultTable, ScoredSource};
use crate::contingency::Contingency;
use crate::methods::{score_counts, Method};
use crate::network::NetworkIndex;
use crate::oracle::{ExactOracle, PValueOracle};
use crate::validate::{validate_inputs, ValidationReport};

/// Output of a scoring run.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRun {
    pub table: ResultTable,
    pub report: ValidationReport,
}

/// Score every source node of the network against the evidence.
#[instrument(skip_all, fields(method = %config.method))]
pub fn score(
    relations: &RawTable,
    evidence: &RawTable,
    entities: &RawTable,
    config: &ScoringConfig,
    oracle: &dyn PValueOracle,
) -> Result<ScoreRun> {
    let method: Method = config.method.parse()?;
    let (input, report) = validate_inputs(relations, evidence, entities, config)?;

    let index = NetworkIndex::new(&input);
    info!(
        sources = index.len(),
        mrna = index.mrna_count(),
        "Scoring source nodes"
    );

    let sources: Vec<ScoredSource> = (0..index.len())
        .into_par_iter()
        .map(|i| {
            let source = index.source(i);
            let counts = Contingency::from_source(&source);
            let scored = score_counts(method, &counts, oracle)?;
            debug!(
                source = %source.uid,
                children = source.children.len(),
                pvalue_up = scored.pvalue_up,
                pvalue_down = scored.pvalue_down,
                "Source scored"
            );
            Ok(ScoredSource {
                name: index.symbol(&source.uid).to_string(),
                uid: source.uid,
                counts,
                scored,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let table = ResultTable::assemble(&sources);
    info!(rows = table.len(), "Result table assembled");

    Ok(ScoreRun { table, report })
}

/// [`score`] with the exact null model.
pub fn score_with_exact_oracle(
    relations: &RawTable,
    evidence: &RawTable,
    entities: &RawTable,
    config: &ScoringConfig,
) -> Result<ScoreRun> {
    score(relations, evidence, entities, config, &ExactOracle::new())
}
