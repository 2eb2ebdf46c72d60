//! Shared fixtures for regscore tests: table builders, the two-target
//! reference scenario, and seeded synthetic networks.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use regscore_common::{Cell, RawTable, ScoringConfig};

/// Entities table from `(uid, id, symbol, type)` tuples.
pub fn entities_table(rows: &[(&str, &str, &str, &str)]) -> RawTable {
    rows.iter().fold(
        RawTable::new(["uid", "id", "symbol", "type"]),
        |table, (uid, id, symbol, kind)| table.with_row([*uid, *id, *symbol, *kind]),
    )
}

/// Relations table from `(srcuid, trguid, mode)` tuples.
pub fn relations_table(rows: &[(&str, &str, &str)]) -> RawTable {
    rows.iter().fold(
        RawTable::new(["srcuid", "trguid", "mode"]),
        |table, (src, trg, mode)| table.with_row([*src, *trg, *mode]),
    )
}

/// Evidence table from `(entrez, fc, pvalue)` tuples.
pub fn evidence_table(rows: &[(&str, f64, f64)]) -> RawTable {
    rows.iter().fold(
        RawTable::new(["entrez", "fc", "pvalue"]),
        |table, (entrez, fc, pvalue)| {
            table.with_row([Cell::from(*entrez), Cell::Number(*fc), Cell::Number(*pvalue)])
        },
    )
}

/// One protein `A` increasing `T1` and decreasing `T2`, with evidence that
/// `T1` went up and `T2` went down.
pub mod scenario {
    use super::*;

    pub fn entities() -> RawTable {
        entities_table(&[
            ("A", "geneA", "A", "protein"),
            ("T1", "1001", "T1", "mRNA"),
            ("T2", "1002", "T2", "mRNA"),
        ])
    }

    pub fn relations() -> RawTable {
        relations_table(&[("A", "T1", "increases"), ("A", "T2", "decreases")])
    }

    pub fn evidence() -> RawTable {
        evidence_table(&[("1001", 2.0, 0.001), ("1002", -2.5, 0.002)])
    }

    pub fn config() -> ScoringConfig {
        ScoringConfig {
            method: "Quaternary".to_string(),
            fc_thresh: 1.3,
            is_logfc: false,
            pval_thresh: 0.01,
        }
    }
}

/// Randomly generated but reproducible input tables.
#[derive(Debug, Clone)]
pub struct SyntheticNetwork {
    pub relations: RawTable,
    pub evidence: RawTable,
    pub entities: RawTable,
}

/// Build a network of `sources` regulators over `targets` mRNAs, each
/// regulator reaching `fanout` distinct targets.
///
/// Source `S0` is planted: every one of its signed targets moves in the
/// predicted direction. About a third of all other targets carry random
/// evidence that passes the default thresholds; a further slice carries
/// evidence that fails them.
pub fn synthetic_network(
    seed: u64,
    sources: usize,
    targets: usize,
    fanout: usize,
) -> SyntheticNetwork {
    let mut rng = StdRng::seed_from_u64(seed);
    let fanout = fanout.min(targets);

    let mut entities = RawTable::new(["uid", "id", "symbol", "type"]);
    for i in 0..sources {
        entities.push_row([
            format!("S{}", i),
            format!("src{}", i),
            format!("SRC{}", i),
            "protein".to_string(),
        ]);
    }
    for j in 0..targets {
        entities.push_row([
            format!("T{}", j),
            entrez(j),
            format!("GENE{}", j),
            "mRNA".to_string(),
        ]);
    }

    let modes = ["increases", "decreases", "regulates"];
    let mut relations = RawTable::new(["srcuid", "trguid", "mode"]);
    // planted direction per target: Some(+1/-1) when S0 fixes it
    let mut planted: Vec<Option<f64>> = vec![None; targets];
    for i in 0..sources {
        for j in sample(&mut rng, targets, fanout).into_iter() {
            let mode = if i == 0 {
                modes[rng.gen_range(0..2)]
            } else {
                modes[rng.gen_range(0..3)]
            };
            if i == 0 {
                planted[j] = Some(if mode == "increases" { 1.0 } else { -1.0 });
            }
            relations.push_row([format!("S{}", i), format!("T{}", j), mode.to_string()]);
        }
    }

    let mut evidence = RawTable::new(["entrez", "fc", "pvalue"]);
    for (j, direction) in planted.iter().enumerate() {
        let (fc, pvalue) = match direction {
            Some(d) => (d * rng.gen_range(1.5..4.0), rng.gen_range(0.0..0.01)),
            None if rng.gen_bool(0.33) => {
                let d = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                (d * rng.gen_range(1.5..4.0), rng.gen_range(0.0..0.01))
            }
            None if rng.gen_bool(0.2) => (rng.gen_range(-1.2..1.2), rng.gen_range(0.1..1.0)),
            None => continue,
        };
        evidence.push_row([Cell::from(entrez(j)), Cell::Number(fc), Cell::Number(pvalue)]);
    }

    SyntheticNetwork {
        relations,
        evidence,
        entities,
    }
}

fn entrez(j: usize) -> String {
    format!("{}", 10_000 + j)
}
