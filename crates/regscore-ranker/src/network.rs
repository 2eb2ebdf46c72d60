//! Per-source view of the validated network.
//!
//! Relations are grouped once by source. The per-source vectors (child
//! signs and observed values, and observed values of every other mRNA) are
//! built on demand so that only the sources currently being scored hold them.

use std::collections::{HashMap, HashSet};

use crate::validate::ValidatedInput;

/// Direct children of one source node and the evidence seen on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIndex {
    pub uid: String,
    pub children: Vec<String>,
    /// Predicted sign per child: +1, -1 or 0 (ambiguous)
    pub signs: Vec<i8>,
    /// Observed value per child: +1, -1 or 0 (no evidence)
    pub child_values: Vec<i8>,
    /// Observed value for every mRNA that is not a child
    pub non_child_values: Vec<i8>,
}

#[derive(Debug, Clone)]
struct SourceGroup {
    uid: String,
    /// (target uid, predicted sign) in relation order
    children: Vec<(String, i8)>,
}

/// Source grouping plus lookups shared by all sources.
#[derive(Debug, Clone)]
pub struct NetworkIndex {
    groups: Vec<SourceGroup>,
    symbols: HashMap<String, String>,
    evidence: HashMap<String, i8>,
    mrna: Vec<String>,
}

impl NetworkIndex {
    pub fn new(input: &ValidatedInput) -> Self {
        let mut groups: Vec<SourceGroup> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();

        for rel in &input.relations {
            let slot = *position.entry(rel.srcuid.as_str()).or_insert_with(|| {
                groups.push(SourceGroup {
                    uid: rel.srcuid.clone(),
                    children: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot]
                .children
                .push((rel.trguid.clone(), rel.mode.sign()));
        }

        let symbols = input
            .entities
            .iter()
            .map(|e| (e.uid.clone(), e.symbol.clone()))
            .collect();
        let evidence = input
            .evidence
            .iter()
            .map(|e| (e.uid.clone(), e.val))
            .collect();
        let mrna = input
            .entities
            .iter()
            .filter(|e| e.is_mrna())
            .map(|e| e.uid.clone())
            .collect();

        Self {
            groups,
            symbols,
            evidence,
            mrna,
        }
    }

    /// Number of hypothesis sources.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of mRNA entities.
    pub fn mrna_count(&self) -> usize {
        self.mrna.len()
    }

    /// Source uids in order of first appearance in the relations.
    pub fn source_uids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.uid.as_str())
    }

    /// Symbol of an entity, empty when unknown.
    pub fn symbol(&self, uid: &str) -> &str {
        self.symbols.get(uid).map(String::as_str).unwrap_or_default()
    }

    /// Observed value of an mRNA: +1, -1, or 0 when it has no evidence.
    pub fn value(&self, uid: &str) -> i8 {
        self.evidence.get(uid).copied().unwrap_or(0)
    }

    /// Build the full per-source view for the i-th source.
    pub fn source(&self, i: usize) -> SourceIndex {
        let group = &self.groups[i];

        let children: Vec<String> = group.children.iter().map(|(t, _)| t.clone()).collect();
        let signs: Vec<i8> = group.children.iter().map(|(_, s)| *s).collect();
        let child_values: Vec<i8> = children.iter().map(|t| self.value(t)).collect();

        let child_set: HashSet<&str> = children.iter().map(String::as_str).collect();
        let non_child_values: Vec<i8> = self
            .mrna
            .iter()
            .filter(|uid| !child_set.contains(uid.as_str()))
            .map(|uid| self.value(uid))
            .collect();

        SourceIndex {
            uid: group.uid.clone(),
            children,
            signs,
            child_values,
            non_child_values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{Entity, Evidence, Mode, Relation};
    use pretty_assertions::assert_eq;

    fn entity(uid: &str, kind: &str) -> Entity {
        Entity {
            uid: uid.into(),
            id: uid.into(),
            symbol: format!("sym-{}", uid),
            entity_type: kind.into(),
        }
    }

    fn relation(src: &str, trg: &str, mode: Mode) -> Relation {
        Relation {
            srcuid: src.into(),
            trguid: trg.into(),
            mode,
        }
    }

    fn input() -> ValidatedInput {
        ValidatedInput {
            entities: vec![
                entity("A", "protein"),
                entity("B", "compound"),
                entity("T1", "mRNA"),
                entity("T2", "mRNA"),
                entity("T3", "mRNA"),
                entity("T4", "mRNA"),
            ],
            relations: vec![
                relation("B", "T3", Mode::Regulates),
                relation("A", "T1", Mode::Increases),
                relation("B", "T1", Mode::Decreases),
                relation("A", "T2", Mode::Decreases),
            ],
            evidence: vec![
                Evidence { uid: "T1".into(), val: 1 },
                Evidence { uid: "T4".into(), val: -1 },
            ],
        }
    }

    #[test]
    fn test_sources_in_first_appearance_order() {
        let index = NetworkIndex::new(&input());
        assert_eq!(index.source_uids().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(index.mrna_count(), 4);
        assert_eq!(index.symbol("A"), "sym-A");
    }

    #[test]
    fn test_source_vectors() {
        let index = NetworkIndex::new(&input());
        let b = index.source(0);

        assert_eq!(b.children, vec!["T3", "T1"]);
        assert_eq!(b.signs, vec![0, -1]);
        assert_eq!(b.child_values, vec![0, 1]);
        // non-children T2, T4 in entity order
        assert_eq!(b.non_child_values, vec![0, -1]);
    }

    #[test]
    fn test_child_and_non_child_cover_all_mrna() {
        let index = NetworkIndex::new(&input());
        for i in 0..index.len() {
            let s = index.source(i);
            assert_eq!(s.children.len() + s.non_child_values.len(), index.mrna_count());
        }
    }
}
