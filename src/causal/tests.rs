//! Causal Context Tests
//!
//! ## Test Scopes
//! - **Comparisons**: dominance, concurrency and their algebraic relationships.
//! - **Tie-break**: the first differing index decides between concurrent rows.
//! - **Matrix**: zeroed construction, local increments and merges.

#[cfg(test)]
mod tests {
    use crate::causal::*;

    fn sample_rows() -> Vec<ClockRow> {
        let mut rows = Vec::new();
        for a in 0..3u64 {
            for b in 0..3u64 {
                for c in 0..3u64 {
                    rows.push(vec![a, b, c]);
                }
            }
        }
        rows
    }

    // ============================================================
    // COMPARISON TESTS
    // ============================================================

    #[test]
    fn test_mutual_dominance_implies_equality() {
        let rows = sample_rows();
        for a in &rows {
            for b in &rows {
                if dominates(a, b) && dominates(b, a) {
                    assert_eq!(a, b, "{:?} and {:?} dominate each other", a, b);
                }
            }
        }
    }

    #[test]
    fn test_dominance_excludes_concurrency() {
        let rows = sample_rows();
        for a in &rows {
            for b in &rows {
                if dominates(a, b) {
                    assert!(!concurrent(a, b), "{:?} dominates {:?} yet concurrent", a, b);
                }
            }
        }
    }

    #[test]
    fn test_concurrent_rows() {
        assert!(concurrent(&[1, 0], &[0, 1]));
        assert!(!concurrent(&[1, 1], &[0, 1]));
        assert!(!concurrent(&[2, 3], &[2, 3]));
    }

    #[test]
    fn test_compare_orders() {
        assert_eq!(compare(&[1, 2], &[1, 2]), CausalOrder::Equal);
        assert_eq!(compare(&[2, 2], &[1, 2]), CausalOrder::After);
        assert_eq!(compare(&[0, 2], &[1, 2]), CausalOrder::Before);
        assert_eq!(compare(&[0, 3], &[1, 2]), CausalOrder::Concurrent);
    }

    #[test]
    fn test_rows_of_different_width_pad_with_zero() {
        assert!(dominates(&[1, 0], &[1]));
        assert!(dominates(&[1], &[1, 0]));
        assert!(!dominates(&[1], &[1, 1]));
    }

    // ============================================================
    // TIE-BREAK TESTS
    // ============================================================

    #[test]
    fn test_first_difference_wins() {
        let resolver = FirstDifferenceWins;

        // Index 0 differs first: larger value there wins.
        assert!(resolver.incoming_wins(&[2, 0, 5], &[1, 9, 0]));
        assert!(!resolver.incoming_wins(&[1, 9, 0], &[2, 0, 5]));

        // Equal prefix, decided at index 1.
        assert!(resolver.incoming_wins(&[1, 3, 0], &[1, 2, 7]));
    }

    #[test]
    fn test_tie_break_is_antisymmetric() {
        let resolver = FirstDifferenceWins;
        let rows = sample_rows();
        for a in &rows {
            for b in &rows {
                if concurrent(a, b) {
                    assert_ne!(
                        resolver.incoming_wins(a, b),
                        resolver.incoming_wins(b, a),
                        "exactly one of {:?} / {:?} must win",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_supersedes() {
        let resolver = FirstDifferenceWins;

        assert!(supersedes(&[2, 1], &[1, 1], &resolver));
        assert!(supersedes(&[1, 1], &[1, 1], &resolver));
        assert!(!supersedes(&[1, 0], &[1, 1], &resolver));

        // Concurrent: [1,0] vs [0,1] -> index 0 decides in favour of [1,0].
        assert!(supersedes(&[1, 0], &[0, 1], &resolver));
        assert!(!supersedes(&[0, 1], &[1, 0], &resolver));
    }

    #[test]
    fn test_pointwise_helpers() {
        assert_eq!(pointwise_max(&[1, 4, 0], &[3, 2, 0]), vec![3, 4, 0]);
        assert_eq!(pointwise_min(&[1, 4, 0], &[3, 2, 0]), vec![1, 2, 0]);
    }

    // ============================================================
    // MATRIX TESTS
    // ============================================================

    #[test]
    fn test_new_context_is_zeroed() {
        let context = CausalContext::new(3, 2);

        assert_eq!(context.num_shards(), 3);
        assert_eq!(context.replication_factor(), 2);
        for shard in 0..3 {
            assert_eq!(context.row(shard), Some(&[0u64, 0][..]));
        }
        assert_eq!(context.row(3), None);
    }

    #[test]
    fn test_increment_touches_one_cell() {
        let mut context = CausalContext::new(2, 3);

        let first = context.increment(1, 2);
        let second = context.increment(1, 2);

        assert_eq!(first, vec![0, 0, 1]);
        assert_eq!(second, vec![0, 0, 2]);
        assert_eq!(context.row(0), Some(&[0u64, 0, 0][..]));
    }

    #[test]
    fn test_merge_takes_pointwise_max() {
        let mut context = CausalContext::new(1, 3);
        context.increment(0, 0);

        context.merge(0, &[0, 4, 1]);

        assert_eq!(context.row(0), Some(&[1u64, 4, 1][..]));
        // A later local write now dominates the merged row.
        let next = context.increment(0, 0);
        assert!(dominates(&next, &[0, 4, 1]));
    }
}
