//! regscore-ranker: Regulator scoring engine.
//!
//! Scores every source node of a signed causal network by how well the
//! predicted direction of its direct targets matches observed differential
//! expression, under three statistics (Quaternary, Ternary, Enrichment).

pub mod validate;
pub mod network;
pub mod contingency;
pub mod methods;
pub mod oracle;
pub mod assemble;
pub mod pipeline;

pub use assemble::{RegulatorScore, ResultTable};
pub use methods::{Method, Regulation};
pub use oracle::{ExactOracle, MockOracle, OracleQuery, PValueOracle};
pub use pipeline::{score, score_with_exact_oracle, ScoreRun};
pub use validate::ValidationReport;
