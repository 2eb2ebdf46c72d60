//! regscore: rank the regulators of a causal network against differential
//! expression evidence.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use regscore_common::tables::{load_table, ENTITIES_SCHEMA, EVIDENCE_SCHEMA, RELATIONS_SCHEMA};
use regscore_common::ScoringConfig;
use regscore_ranker::{score_with_exact_oracle, ResultTable};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "regscore", version)]
#[command(about = "Score causal network regulators against differential expression evidence")]
struct Args {
    /// Relations table (srcuid, trguid, mode)
    #[arg(long)]
    relations: PathBuf,

    /// Evidence table (entrez, fc, pvalue)
    #[arg(long)]
    evidence: PathBuf,

    /// Entities table (uid, id, symbol, type)
    #[arg(long)]
    entities: PathBuf,

    /// YAML or TOML scoring config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Quaternary, Ternary or Enrichment
    #[arg(long)]
    method: Option<String>,

    #[arg(long)]
    fc_thresh: Option<f64>,

    /// Evidence fold changes are log2 values
    #[arg(long)]
    logfc: bool,

    #[arg(long)]
    pval_thresh: Option<f64>,

    /// Result CSV path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Keep only the K most significant rows
    #[arg(long)]
    top: Option<usize>,

    /// Write the validation report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn scoring_config(&self) -> anyhow::Result<ScoringConfig> {
        let mut config = match &self.config {
            Some(path) => ScoringConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ScoringConfig::default(),
        };

        if let Some(method) = &self.method {
            config.method = method.clone();
        }
        if let Some(fc) = self.fc_thresh {
            config.fc_thresh = fc;
        }
        if self.logfc {
            config.is_logfc = true;
        }
        if let Some(p) = self.pval_thresh {
            config.pval_thresh = p;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("regscore=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.scoring_config()?;
    info!(
        method = %config.method,
        fc_thresh = config.fc_thresh,
        is_logfc = config.is_logfc,
        pval_thresh = config.pval_thresh,
        "Starting scoring run"
    );

    let (relations, evidence, entities) = tokio::try_join!(
        load_table(&args.relations, &RELATIONS_SCHEMA),
        load_table(&args.evidence, &EVIDENCE_SCHEMA),
        load_table(&args.entities, &ENTITIES_SCHEMA),
    )?;

    let run = tokio::task::spawn_blocking(move || {
        score_with_exact_oracle(&relations, &evidence, &entities, &config)
    })
    .await??;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&run.report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing report {}", path.display()))?;
    }

    let table = match args.top {
        Some(k) => ResultTable {
            rows: run.table.top(k).to_vec(),
        },
        None => run.table,
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            table.write_csv(&mut writer)?;
            writer.flush()?;
            info!(rows = table.len(), path = %path.display(), "Results written");
        }
        None => {
            let stdout = io::stdout();
            table.write_csv(stdout.lock())?;
        }
    }

    Ok(())
}
