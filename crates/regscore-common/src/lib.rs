//! regscore-common: Shared types, errors, and table I/O used across all regscore crates.

pub mod error;
pub mod config;
pub mod tables;

// Re-export commonly used types
pub use config::ScoringConfig;
pub use error::{RegScoreError, Result};
pub use tables::{Cell, ColumnKind, RawTable, TableKind, TableSchema};
