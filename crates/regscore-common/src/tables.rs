//! Raw tabular input model and CSV/TSV I/O.
//!
//! The three scoring inputs (relations, evidence, entities) arrive as loosely
//! typed tables. Cells keep whatever the caller or the file provided so the
//! validator can report missing values and type mismatches precisely.
//!
//! Usage:
//! ```ignore
//! let evidence = load_table(Path::new("evidence.tsv"), TableKind::Evidence.schema()).await?;
//! ```

use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Spellings read as a missing cell.
const MISSING_MARKERS: &[&str] = &["", "NA", "NaN", "null"];

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    /// Short type name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Cell::Text(_) => "text",
            Cell::Number(_) => "numeric",
            Cell::Missing => "missing",
        }
    }

    /// True for explicit missing cells and NaN numbers.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Number(x) => x.is_nan(),
            Cell::Text(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(x) => Some(*x),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Number(x)
    }
}

// ── Schemas ──────────────────────────────────────────────────────────────────

/// The three input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Relations,
    Evidence,
    Entities,
}

impl TableKind {
    pub fn schema(self) -> &'static TableSchema {
        match self {
            TableKind::Relations => &RELATIONS_SCHEMA,
            TableKind::Evidence => &EVIDENCE_SCHEMA,
            TableKind::Entities => &ENTITIES_SCHEMA,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableKind::Relations => "relations",
            TableKind::Evidence => "evidence",
            TableKind::Entities => "entities",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColumnKind::Text => "text",
            ColumnKind::Numeric => "numeric",
        })
    }
}

/// Expected column set of an input table.
#[derive(Debug)]
pub struct TableSchema {
    pub kind: TableKind,
    pub columns: &'static [(&'static str, ColumnKind)],
}

impl TableSchema {
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(col, _)| *col == name)
            .map(|(_, kind)| *kind)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }
}

pub static RELATIONS_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Relations,
    columns: &[
        ("srcuid", ColumnKind::Text),
        ("trguid", ColumnKind::Text),
        ("mode", ColumnKind::Text),
    ],
};

pub static EVIDENCE_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Evidence,
    columns: &[
        ("entrez", ColumnKind::Text),
        ("fc", ColumnKind::Numeric),
        ("pvalue", ColumnKind::Numeric),
    ],
};

pub static ENTITIES_SCHEMA: TableSchema = TableSchema {
    kind: TableKind::Entities,
    columns: &[
        ("uid", ColumnKind::Text),
        ("id", ColumnKind::Text),
        ("symbol", ColumnKind::Text),
        ("type", ColumnKind::Text),
    ],
};

// ── RawTable ─────────────────────────────────────────────────────────────────

/// A loosely typed table: named columns, rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row (builder style).
    pub fn with_row<I, C>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.push_row(row);
        self
    }

    pub fn push_row<I, C>(&mut self, row: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// ── Reading ──────────────────────────────────────────────────────────────────

/// Parse delimited text into a table, typing cells by `schema`.
///
/// Numeric schema columns are parsed as `f64`; values that fail to parse stay
/// `Text` so validation can report them. Columns unknown to the schema are
/// kept as text.
pub fn parse_table(text: &str, delimiter: u8, schema: &TableSchema) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|c| schema.column_kind(c).unwrap_or(ColumnKind::Text))
        .collect();

    let mut table = RawTable {
        columns,
        rows: Vec::new(),
    };

    for result in reader.records() {
        let record = result?;
        let row = record
            .iter()
            .zip(kinds.iter())
            .map(|(field, kind)| parse_cell(field, *kind))
            .collect();
        table.rows.push(row);
    }

    debug!(table = %schema.kind, rows = table.len(), "Parsed input table");
    Ok(table)
}

fn parse_cell(field: &str, kind: ColumnKind) -> Cell {
    if MISSING_MARKERS.contains(&field) {
        return Cell::Missing;
    }
    match kind {
        ColumnKind::Numeric => field
            .parse::<f64>()
            .map(Cell::Number)
            .unwrap_or_else(|_| Cell::Text(field.to_string())),
        ColumnKind::Text => Cell::Text(field.to_string()),
    }
}

/// Field delimiter inferred from a file extension: tab for `.tsv`/`.txt`,
/// comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt") => b'\t',
        _ => b',',
    }
}

/// Load a table from disk.
pub async fn load_table(path: &Path, schema: &TableSchema) -> Result<RawTable> {
    debug!("Loading {} table from {:?}", schema.kind, path);
    let content = tokio::fs::read_to_string(path).await?;
    parse_table(&content, delimiter_for(path), schema)
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Write serializable records as CSV with a header row.
pub fn write_records<W, T>(writer: W, records: &[T]) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut out = csv::Writer::from_writer(writer);
    for record in records {
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_types_numeric_columns() {
        let text = "entrez,fc,pvalue\n1001,2.0,0.001\n1002,-2.5,NA\n";
        let table = parse_table(text, b',', &EVIDENCE_SCHEMA).unwrap();

        assert_eq!(table.columns, vec!["entrez", "fc", "pvalue"]);
        assert_eq!(
            table.rows[0],
            vec![Cell::from("1001"), Cell::Number(2.0), Cell::Number(0.001)]
        );
        assert_eq!(table.rows[1][2], Cell::Missing);
    }

    #[test]
    fn test_unparseable_number_stays_text() {
        let text = "entrez\tfc\tpvalue\n1001\thigh\t0.01\n";
        let table = parse_table(text, b'\t', &EVIDENCE_SCHEMA).unwrap();
        assert_eq!(table.rows[0][1], Cell::from("high"));
    }

    #[test]
    fn test_identifier_columns_stay_text() {
        let text = "uid,id,symbol,type\nT1,1001,T1,mRNA\n";
        let table = parse_table(text, b',', &ENTITIES_SCHEMA).unwrap();
        assert_eq!(table.rows[0][1], Cell::from("1001"));
    }

    #[test]
    fn test_delimiter_from_extension() {
        assert_eq!(delimiter_for(Path::new("rels.tsv")), b'\t');
        assert_eq!(delimiter_for(Path::new("rels.TXT")), b'\t');
        assert_eq!(delimiter_for(Path::new("rels.csv")), b',');
        assert_eq!(delimiter_for(Path::new("rels")), b',');
    }

    #[test]
    fn test_nan_counts_as_missing() {
        assert!(Cell::Number(f64::NAN).is_missing());
        assert!(!Cell::Number(0.0).is_missing());
    }

    #[derive(Serialize)]
    struct Row {
        uid: &'static str,
        #[serde(rename = "correct.pred")]
        correct_pred: u64,
    }

    #[test]
    fn test_write_records_header_and_rows() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[Row { uid: "A", correct_pred: 2 }]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "uid,correct.pred\nA,2\n");
    }

    #[tokio::test]
    async fn test_load_table_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relations.tsv");
        std::fs::write(&path, "srcuid\ttrguid\tmode\nA\tT1\tincreases\n").unwrap();

        let table = load_table(&path, &RELATIONS_SCHEMA).await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][2], Cell::from("increases"));
    }
}
