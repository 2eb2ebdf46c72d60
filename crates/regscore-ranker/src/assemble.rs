//! Result table: two rows per source, ranked by p-value.

use std::io::Write;

use serde::{Deserialize, Serialize};

use regscore_common::tables::write_records;
use regscore_common::Result;

use crate::contingency::Contingency;
use crate::methods::{MethodScore, Regulation};

/// One (source, hypothesis) row of the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatorScore {
    pub uid: String,
    /// Source symbol
    pub name: String,
    pub regulation: Regulation,
    #[serde(rename = "correct.pred")]
    pub correct_pred: u64,
    #[serde(rename = "incorrect.pred")]
    pub incorrect_pred: u64,
    pub score: i64,
    #[serde(rename = "total.reachable")]
    pub total_reachable: u64,
    #[serde(rename = "significant.reachable")]
    pub significant_reachable: u64,
    #[serde(rename = "total.ambiguous")]
    pub total_ambiguous: u64,
    #[serde(rename = "significant.ambiguous")]
    pub significant_ambiguous: u64,
    pub unknown: u64,
    pub pvalue: f64,
}

/// Everything computed for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSource {
    pub uid: String,
    pub name: String,
    /// Raw counts, before any method rewrite
    pub counts: Contingency,
    pub scored: MethodScore,
}

impl ScoredSource {
    /// The up row followed by the down row.
    ///
    /// Prediction counts and score always come from the raw signed
    /// children. The `total.*` and `unknown` columns follow the oracle query;
    /// the `significant.*` columns follow the method's reported counts, which
    /// keep ambiguous children under Ternary.
    pub fn rows(&self) -> [RegulatorScore; 2] {
        let correct = self.counts.correct_up();
        let incorrect = self.counts.incorrect_up();
        let effective = &self.scored.effective;
        let query = &self.scored.up;

        let row = |regulation, correct_pred: u64, incorrect_pred: u64, pvalue| RegulatorScore {
            uid: self.uid.clone(),
            name: self.name.clone(),
            regulation,
            correct_pred,
            incorrect_pred,
            score: correct_pred as i64 - incorrect_pred as i64,
            total_reachable: query.predicted(),
            significant_reachable: effective.significant_reachable(),
            total_ambiguous: query.q_r,
            significant_ambiguous: effective.significant_ambiguous(),
            unknown: query.q_zero,
            pvalue,
        };

        [
            row(Regulation::Up, correct, incorrect, self.scored.pvalue_up),
            row(Regulation::Down, incorrect, correct, self.scored.pvalue_down),
        ]
    }
}

/// Ranked result table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<RegulatorScore>,
}

impl ResultTable {
    /// Flatten sources (in first-appearance order) and sort by p-value.
    ///
    /// The sort is stable: ties keep source order, up before down.
    pub fn assemble(sources: &[ScoredSource]) -> Self {
        let mut rows: Vec<RegulatorScore> = sources.iter().flat_map(|s| s.rows()).collect();
        rows.sort_by(|a, b| a.pvalue.total_cmp(&b.pvalue));
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The `k` most significant rows.
    pub fn top(&self, k: usize) -> &[RegulatorScore] {
        &self.rows[..k.min(self.rows.len())]
    }

    /// Row of a given source and hypothesis.
    pub fn find(&self, uid: &str, regulation: Regulation) -> Option<&RegulatorScore> {
        self.rows
            .iter()
            .find(|r| r.uid == uid && r.regulation == regulation)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_records(writer, &self.rows)
    }
}
