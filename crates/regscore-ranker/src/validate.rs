//! Input validation and normalisation.
//!
//! Turns the three raw tables into the typed model used by the rest of the
//! engine. Every check failure aborts the whole run; the only non-fatal
//! condition is evidence whose entrez id is unknown, which is dropped and
//! counted in the [`ValidationReport`].
//!
//! Check order per table: rows present, column set, missing cells, cell
//! types, exact duplicate rows, then table-specific checks (unique keys,
//! p-value range, relation modes). Cross-table checks run last.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use regscore_common::{
    Cell, ColumnKind, RawTable, RegScoreError, Result, ScoringConfig, TableKind, TableSchema,
};

/// Entity type of measurable target nodes.
pub const MRNA_TYPE: &str = "mRNA";

/// Effect of a source on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Increases,
    Decreases,
    Regulates,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "increases" => Some(Mode::Increases),
            "decreases" => Some(Mode::Decreases),
            "regulates" => Some(Mode::Regulates),
            _ => None,
        }
    }

    /// Predicted sign: +1 increases, -1 decreases, 0 ambiguous.
    pub fn sign(self) -> i8 {
        match self {
            Mode::Increases => 1,
            Mode::Decreases => -1,
            Mode::Regulates => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Increases => "increases",
            Mode::Decreases => "decreases",
            Mode::Regulates => "regulates",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub uid: String,
    /// Entrez gene id for mRNA entities
    pub id: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub entity_type: String,
}

impl Entity {
    pub fn is_mrna(&self) -> bool {
        self.entity_type == MRNA_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub srcuid: String,
    pub trguid: String,
    pub mode: Mode,
}

/// Normalised evidence: a differentially expressed mRNA and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub uid: String,
    /// +1 up, -1 down
    pub val: i8,
}

/// Evidence row as read from the raw table.
#[derive(Debug, Clone)]
struct RawEvidence {
    entrez: String,
    fc: f64,
    pvalue: f64,
}

/// Output of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    pub relations: Vec<Relation>,
    pub evidence: Vec<Evidence>,
    pub entities: Vec<Entity>,
}

/// Counters collected while normalising.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub evidence_rows: usize,
    pub evidence_passing_thresholds: usize,
    /// Rows dropped because their entrez id matched no mRNA entity.
    pub evidence_unmapped: usize,
    pub evidence_retained: usize,
    /// (srcuid, trguid) pairs listed more than once and collapsed to `regulates`.
    pub ambiguous_pairs: usize,
    pub relations_retained: usize,
}

/// Validate and normalise the three input tables.
pub fn validate_inputs(
    relations: &RawTable,
    evidence: &RawTable,
    entities: &RawTable,
    config: &ScoringConfig,
) -> Result<(ValidatedInput, ValidationReport)> {
    config.validate()?;

    let entities = read_entities(entities)?;
    let relations = read_relations(relations)?;
    let raw_evidence = read_evidence(evidence)?;

    check_references(&relations, &entities)?;

    let (relations, ambiguous_pairs) = collapse_ambiguous(relations);
    let (evidence, mut report) = normalise_evidence(&raw_evidence, &entities, config)?;
    report.ambiguous_pairs = ambiguous_pairs;
    report.relations_retained = relations.len();

    info!(
        entities = entities.len(),
        relations = relations.len(),
        evidence = evidence.len(),
        ambiguous_pairs,
        "Inputs validated"
    );

    Ok((
        ValidatedInput {
            relations,
            evidence,
            entities,
        },
        report,
    ))
}

// ── Table shape ──────────────────────────────────────────────────────────────

/// A raw table whose shape, cells and types match its schema.
struct CheckedTable<'a> {
    table: &'a RawTable,
    /// Raw column position of each schema column, in schema order.
    index: Vec<usize>,
}

impl<'a> CheckedTable<'a> {
    fn rows(&self) -> usize {
        self.table.rows.len()
    }

    fn cell(&self, row: usize, col: usize) -> &'a Cell {
        &self.table.rows[row][self.index[col]]
    }

    fn text(&self, row: usize, col: usize) -> &'a str {
        self.cell(row, col).as_text().unwrap_or_default()
    }

    fn number(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col).as_number().unwrap_or(f64::NAN)
    }
}

fn check_table<'a>(table: &'a RawTable, schema: &TableSchema) -> Result<CheckedTable<'a>> {
    let kind = schema.kind;

    if table.is_empty() {
        return Err(RegScoreError::EmptyInput {
            table: kind,
            detail: "has no rows".to_string(),
        });
    }

    let mut seen_columns = HashSet::new();
    for column in &table.columns {
        if !seen_columns.insert(column.as_str()) {
            return Err(RegScoreError::Schema {
                table: kind,
                detail: format!("column `{}` appears more than once", column),
            });
        }
    }

    let expected = schema.column_names();
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_none())
        .collect();
    let unexpected: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| schema.column_kind(c).is_none())
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(RegScoreError::Schema {
            table: kind,
            detail: format!(
                "expected columns {:?}, missing {:?}, unexpected {:?}",
                expected, missing, unexpected
            ),
        });
    }

    let index: Vec<usize> = expected
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    for (i, row) in table.rows.iter().enumerate() {
        if row.len() != table.columns.len() {
            return Err(RegScoreError::Schema {
                table: kind,
                detail: format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    table.columns.len()
                ),
            });
        }
    }

    for (i, row) in table.rows.iter().enumerate() {
        for (pos, (name, _)) in schema.columns.iter().enumerate() {
            if row[index[pos]].is_missing() {
                return Err(RegScoreError::NaPresent {
                    table: kind,
                    column: name.to_string(),
                    row: i + 1,
                });
            }
        }
    }

    for (i, row) in table.rows.iter().enumerate() {
        for (pos, (name, expected_kind)) in schema.columns.iter().enumerate() {
            let cell = &row[index[pos]];
            let ok = matches!(
                (expected_kind, cell),
                (ColumnKind::Text, Cell::Text(_)) | (ColumnKind::Numeric, Cell::Number(_))
            );
            if !ok {
                return Err(RegScoreError::Type {
                    table: kind,
                    column: name.to_string(),
                    expected: *expected_kind,
                    found: cell.kind_name(),
                    row: i + 1,
                });
            }
        }
    }

    let mut seen_rows = HashSet::new();
    for (i, row) in table.rows.iter().enumerate() {
        let key: Vec<String> = index.iter().map(|&j| cell_key(&row[j])).collect();
        if !seen_rows.insert(key) {
            return Err(RegScoreError::DuplicateRow {
                table: kind,
                detail: format!("row {} repeats an earlier row", i + 1),
            });
        }
    }

    Ok(CheckedTable { table, index })
}

fn cell_key(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => format!("t:{}", s),
        Cell::Number(x) => format!("n:{}", x.to_bits()),
        Cell::Missing => "-".to_string(),
    }
}

// ── Typed readers ────────────────────────────────────────────────────────────

fn read_entities(table: &RawTable) -> Result<Vec<Entity>> {
    let t = check_table(table, TableKind::Entities.schema())?;

    let entities: Vec<Entity> = (0..t.rows())
        .map(|i| Entity {
            uid: t.text(i, 0).to_string(),
            id: t.text(i, 1).to_string(),
            symbol: t.text(i, 2).to_string(),
            entity_type: t.text(i, 3).to_string(),
        })
        .collect();

    let mut seen = HashSet::new();
    for entity in &entities {
        if !seen.insert(entity.uid.as_str()) {
            return Err(RegScoreError::DuplicateRow {
                table: TableKind::Entities,
                detail: format!("uid `{}` is listed more than once", entity.uid),
            });
        }
    }

    let n_mrna = entities.iter().filter(|e| e.is_mrna()).count();
    if n_mrna == 0 {
        return Err(RegScoreError::EmptyInput {
            table: TableKind::Entities,
            detail: "has no mRNA entities".to_string(),
        });
    }
    if n_mrna == entities.len() {
        return Err(RegScoreError::EmptyInput {
            table: TableKind::Entities,
            detail: "has no non-mRNA entities".to_string(),
        });
    }

    debug!(entities = entities.len(), mrna = n_mrna, "Entity catalog read");
    Ok(entities)
}

fn read_relations(table: &RawTable) -> Result<Vec<Relation>> {
    let t = check_table(table, TableKind::Relations.schema())?;

    (0..t.rows())
        .map(|i| {
            let mode_text = t.text(i, 2);
            let mode = Mode::parse(mode_text).ok_or_else(|| RegScoreError::InvalidMode {
                row: i + 1,
                mode: mode_text.to_string(),
            })?;
            Ok(Relation {
                srcuid: t.text(i, 0).to_string(),
                trguid: t.text(i, 1).to_string(),
                mode,
            })
        })
        .collect()
}

fn read_evidence(table: &RawTable) -> Result<Vec<RawEvidence>> {
    let t = check_table(table, TableKind::Evidence.schema())?;

    let rows: Vec<RawEvidence> = (0..t.rows())
        .map(|i| RawEvidence {
            entrez: t.text(i, 0).to_string(),
            fc: t.number(i, 1),
            pvalue: t.number(i, 2),
        })
        .collect();

    let mut seen = HashSet::new();
    for row in &rows {
        if !seen.insert(row.entrez.as_str()) {
            return Err(RegScoreError::DuplicateRow {
                table: TableKind::Evidence,
                detail: format!("entrez id `{}` is listed more than once", row.entrez),
            });
        }
    }

    for (i, row) in rows.iter().enumerate() {
        if !(0.0..=1.0).contains(&row.pvalue) {
            return Err(RegScoreError::OutOfRangeValue {
                row: i + 1,
                value: row.pvalue,
            });
        }
    }

    Ok(rows)
}

fn check_references(relations: &[Relation], entities: &[Entity]) -> Result<()> {
    let by_uid: HashMap<&str, &Entity> = entities.iter().map(|e| (e.uid.as_str(), e)).collect();

    for (i, rel) in relations.iter().enumerate() {
        match by_uid.get(rel.srcuid.as_str()) {
            None => {
                return Err(RegScoreError::UnmappedIdentifier(format!(
                    "relation row {}: srcuid `{}` is not in the entity table",
                    i + 1,
                    rel.srcuid
                )))
            }
            Some(e) if e.is_mrna() => {
                return Err(RegScoreError::UnmappedIdentifier(format!(
                    "relation row {}: srcuid `{}` is an mRNA entity",
                    i + 1,
                    rel.srcuid
                )))
            }
            Some(_) => {}
        }
        match by_uid.get(rel.trguid.as_str()) {
            None => {
                return Err(RegScoreError::UnmappedIdentifier(format!(
                    "relation row {}: trguid `{}` is not in the entity table",
                    i + 1,
                    rel.trguid
                )))
            }
            Some(e) if !e.is_mrna() => {
                return Err(RegScoreError::UnmappedIdentifier(format!(
                    "relation row {}: trguid `{}` is not an mRNA entity",
                    i + 1,
                    rel.trguid
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

// ── Normalisation ────────────────────────────────────────────────────────────

/// Collapse repeated (srcuid, trguid) pairs into one `regulates` relation.
///
/// The surviving row sits at the position of the pair's first occurrence.
/// Returns the collapsed relations and the number of repeated pairs.
pub fn collapse_ambiguous(relations: Vec<Relation>) -> (Vec<Relation>, usize) {
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for rel in &relations {
        *counts
            .entry((rel.srcuid.clone(), rel.trguid.clone()))
            .or_default() += 1;
    }
    let ambiguous = counts.values().filter(|&&n| n > 1).count();

    let mut seen = HashSet::new();
    let collapsed = relations
        .into_iter()
        .filter_map(|mut rel| {
            let key = (rel.srcuid.clone(), rel.trguid.clone());
            if counts.get(&key).copied().unwrap_or(0) > 1 {
                rel.mode = Mode::Regulates;
            }
            seen.insert(key).then_some(rel)
        })
        .collect();

    (collapsed, ambiguous)
}

fn normalise_evidence(
    rows: &[RawEvidence],
    entities: &[Entity],
    config: &ScoringConfig,
) -> Result<(Vec<Evidence>, ValidationReport)> {
    let fc_cut = config.effective_fc_thresh();
    let passing: Vec<&RawEvidence> = rows
        .iter()
        .filter(|r| r.fc.abs() >= fc_cut && r.pvalue <= config.pval_thresh)
        .collect();

    debug!(
        rows = rows.len(),
        passing = passing.len(),
        fc_cut,
        pval_thresh = config.pval_thresh,
        "Evidence thresholds applied"
    );

    if passing.is_empty() {
        return Err(RegScoreError::NoDataAfterFiltering(format!(
            "applying thresholds |fc| >= {} and pvalue <= {}",
            fc_cut, config.pval_thresh
        )));
    }

    let mut by_entrez: HashMap<&str, Vec<&str>> = HashMap::new();
    for entity in entities.iter().filter(|e| e.is_mrna()) {
        by_entrez
            .entry(entity.id.as_str())
            .or_default()
            .push(entity.uid.as_str());
    }

    let mut unmapped = 0usize;
    let mut evidence = Vec::with_capacity(passing.len());
    for row in &passing {
        match by_entrez.get(row.entrez.as_str()).map(Vec::as_slice) {
            None | Some([]) => unmapped += 1,
            Some([uid]) => evidence.push(Evidence {
                uid: uid.to_string(),
                val: if row.fc > 0.0 { 1 } else { -1 },
            }),
            Some(uids) => {
                return Err(RegScoreError::AmbiguousIdentifierMapping {
                    entrez: row.entrez.clone(),
                    uids: uids.iter().map(|u| u.to_string()).collect(),
                })
            }
        }
    }

    if unmapped > 0 {
        warn!(
            dropped = unmapped,
            "Evidence rows dropped: entrez id matches no mRNA entity"
        );
    }

    if evidence.is_empty() {
        return Err(RegScoreError::NoDataAfterFiltering(
            "mapping entrez ids to mRNA entities".to_string(),
        ));
    }

    let report = ValidationReport {
        evidence_rows: rows.len(),
        evidence_passing_thresholds: passing.len(),
        evidence_unmapped: unmapped,
        evidence_retained: evidence.len(),
        ..Default::default()
    };
    Ok((evidence, report))
}
