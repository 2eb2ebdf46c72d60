use thiserror::Error;

use crate::tables::{ColumnKind, TableKind};

#[derive(Debug, Error)]
pub enum RegScoreError {
    #[error("Schema error in {table} table: {detail}")]
    Schema { table: TableKind, detail: String },

    #[error("Type error in {table} table: column `{column}` must be {expected}, found {found} at row {row}")]
    Type {
        table: TableKind,
        column: String,
        expected: ColumnKind,
        found: &'static str,
        row: usize,
    },

    #[error("Empty input: {table} table {detail}")]
    EmptyInput { table: TableKind, detail: String },

    #[error("Missing value in {table} table: column `{column}`, row {row}")]
    NaPresent {
        table: TableKind,
        column: String,
        row: usize,
    },

    #[error("Duplicate rows in {table} table: {detail}")]
    DuplicateRow { table: TableKind, detail: String },

    #[error("Evidence p-value {value} at row {row} is outside [0, 1]")]
    OutOfRangeValue { row: usize, value: f64 },

    #[error("Unmapped identifier: {0}")]
    UnmappedIdentifier(String),

    #[error("Entrez id {entrez} maps to more than one mRNA entity: {uids:?}")]
    AmbiguousIdentifierMapping { entrez: String, uids: Vec<String> },

    #[error("Invalid mode `{mode}` at relation row {row} (expected increases, decreases or regulates)")]
    InvalidMode { row: usize, mode: String },

    #[error("Invalid method `{0}` (expected Quaternary, Ternary or Enrichment)")]
    InvalidMethod(String),

    #[error("No evidence left after {0}")]
    NoDataAfterFiltering(String),

    #[error("Invalid p-value query: {0}")]
    OracleInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RegScoreError>;
