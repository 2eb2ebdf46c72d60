use proptest::prelude::*;

use regscore_ranker::contingency::Contingency;
use regscore_ranker::{ExactOracle, Method, OracleQuery, PValueOracle, Regulation};

/// Consistent partition sizes over a small population.
fn partitions() -> impl Strategy<Value = OracleQuery> {
    (0u64..6, 0u64..6, 0u64..8, 0u64..5)
        .prop_flat_map(|(q_plus, q_minus, q_zero, q_r)| {
            let population = q_plus + q_minus + q_zero + q_r;
            (
                Just((q_plus, q_minus, q_zero, q_r)),
                0..=population,
                0..=population,
            )
        })
        .prop_map(|((q_plus, q_minus, q_zero, q_r), a, b)| {
            let population = q_plus + q_minus + q_zero + q_r;
            let n_plus = a.min(population);
            let n_minus = b.min(population - n_plus);
            OracleQuery {
                score: 0,
                q_plus,
                q_minus,
                q_zero,
                q_r,
                n_plus,
                n_minus,
                n_zero: population - n_plus - n_minus,
            }
        })
}

fn values() -> impl Strategy<Value = Vec<i8>> {
    prop::collection::vec(-1i8..=1, 0..40)
}

proptest! {
    #[test]
    fn distribution_sums_to_one(query in partitions()) {
        let dist = ExactOracle::new().distribution(&query).unwrap();
        let total: f64 = dist.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "total = {}", total);
        prop_assert!(dist.iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn pvalue_non_increasing_in_score(query in partitions()) {
        let oracle = ExactOracle::new();
        let (lo, hi) = query.score_range();
        let mut previous = f64::INFINITY;
        for score in (lo - 1)..=(hi + 1) {
            let p = oracle.pvalue(&OracleQuery { score, ..query }).unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
            prop_assert!(p <= previous, "score {}: {} > {}", score, p, previous);
            previous = p;
        }
        let floor = oracle.pvalue(&OracleQuery { score: lo, ..query }).unwrap();
        prop_assert!((floor - 1.0).abs() < 1e-9);
        let above = oracle.pvalue(&OracleQuery { score: hi + 1, ..query }).unwrap();
        prop_assert_eq!(above, 0.0);
    }

    #[test]
    fn joint_sign_swap_preserves_pvalue(query in partitions(), offset in -6i64..6) {
        let oracle = ExactOracle::new();
        let query = OracleQuery { score: offset, ..query };
        let swapped = OracleQuery {
            q_plus: query.q_minus,
            q_minus: query.q_plus,
            n_plus: query.n_minus,
            n_minus: query.n_plus,
            ..query
        };
        let a = oracle.pvalue(&query).unwrap();
        let b = oracle.pvalue(&swapped).unwrap();
        prop_assert!((a - b).abs() < 1e-9, "{} vs {}", a, b);
    }

    #[test]
    fn tally_covers_every_node(
        (signs, child_values) in (0usize..30).prop_flat_map(|n| (
            prop::collection::vec(-1i8..=1, n),
            prop::collection::vec(-1i8..=1, n),
        )),
        non_child_values in values(),
    ) {
        let c = Contingency::tally(&signs, &child_values, &non_child_values);
        prop_assert_eq!(c.children() as usize, signs.len());
        prop_assert_eq!(c.non_children() as usize, non_child_values.len());
        prop_assert_eq!(c.population() as usize, signs.len() + non_child_values.len());
        prop_assert_eq!(
            c.correct_up() + c.incorrect_up() + c.nrp + c.nrm,
            c.significant_reachable()
        );

        for method in [Method::Quaternary, Method::Ternary, Method::Enrichment] {
            let up = method.query(&c, Regulation::Up);
            let down = method.query(&c, Regulation::Down);
            prop_assert!(up.check().is_ok());
            prop_assert_eq!(up.population(), down.population());
            prop_assert_eq!(
                (up.n_plus, up.n_minus, up.n_zero),
                (down.n_plus, down.n_minus, down.n_zero)
            );
        }
    }
}
