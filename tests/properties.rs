use proptest::prelude::*;
use span_eval::report::{ItemScores, MetricAverages};
use span_eval::{HashingEmbedder, Scorer, SimilarityMatrix, split_sentences};

fn batch(dim: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-10.0f32..10.0, dim), 1..6)
}

fn batches() -> impl Strategy<Value = (Vec<Vec<f32>>, Vec<Vec<f32>>)> {
    (1usize..8).prop_flat_map(|dim| (batch(dim), batch(dim)))
}

proptest! {
    #[test]
    fn similarity_is_symmetric_under_transpose((a, b) in batches()) {
        let ab = SimilarityMatrix::compute(&a, &b).unwrap();
        let ba = SimilarityMatrix::compute(&b, &a).unwrap();
        for i in 0..a.len() {
            for j in 0..b.len() {
                prop_assert_eq!(ab.get(i, j), ba.get(j, i));
            }
        }
    }

    #[test]
    fn self_similarity_diagonal_is_one(a in (1usize..8).prop_flat_map(batch)) {
        prop_assume!(a.iter().all(|row| row.iter().any(|&x| x.abs() > 1e-3)));
        let m = SimilarityMatrix::compute(&a, &a).unwrap();
        for i in 0..a.len() {
            prop_assert!((m.get(i, i) - 1.0).abs() < 1e-4, "diag {}", m.get(i, i));
        }
    }

    #[test]
    fn similarities_are_finite_and_bounded((a, b) in batches()) {
        let m = SimilarityMatrix::compute(&a, &b).unwrap();
        for i in 0..m.rows() {
            for &v in m.row(i) {
                prop_assert!(v.is_finite());
                prop_assert!((-1.0 - 1e-4..=1.0 + 1e-4).contains(&v));
            }
        }
    }

    #[test]
    fn sentence_units_are_trimmed_and_delimiter_free(text in "[a-z .?!\n\t]{0,80}") {
        for unit in split_sentences(&text) {
            prop_assert!(!unit.is_empty());
            prop_assert_eq!(unit.trim(), unit.as_str());
            prop_assert!(!unit.contains(['.', '?', '!', '\n']));
        }
    }

    #[test]
    fn metrics_stay_in_unit_range(
        gold in prop::collection::vec("[a-z ]{0,20}[.!?]?", 0..4),
        candidate in "[a-z .!?\n]{0,60}",
    ) {
        let provider = HashingEmbedder::new(64);
        let scorer = Scorer::new(&provider);

        let coverage = scorer.semantic_coverage(&gold, &candidate).unwrap();
        let bert_f1 = scorer.bertscore_style(&gold.join(" "), &candidate).unwrap();
        let partial = scorer.partial_correctness(&gold, &candidate).unwrap();

        for score in [coverage, bert_f1, partial] {
            prop_assert!(score.is_finite());
            prop_assert!((0.0..=1.0 + 1e-6).contains(&score), "score {}", score);
        }
    }

    #[test]
    fn partial_falls_back_to_coverage_without_sentences(
        gold in prop::collection::vec("[a-z ]{1,20}", 1..4),
        candidate in "[ .!?\n]{0,10}",
    ) {
        let provider = HashingEmbedder::new(64);
        let scorer = Scorer::new(&provider);

        let partial = scorer.partial_correctness(&gold, &candidate).unwrap();
        let coverage = scorer.semantic_coverage(&gold, &candidate).unwrap();
        prop_assert_eq!(partial, coverage);
    }

    #[test]
    fn averages_do_not_depend_on_order(
        scores in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0), 1..12),
    ) {
        let rows: Vec<ItemScores> = scores
            .iter()
            .enumerate()
            .map(|(i, &(coverage, bert_f1, partial))| ItemScores {
                id: format!("Q{}", i + 1),
                coverage,
                bert_f1,
                partial,
            })
            .collect();
        let mut reversed = rows.clone();
        reversed.reverse();

        let forward = MetricAverages::from_rows(&rows);
        let backward = MetricAverages::from_rows(&reversed);
        prop_assert!((forward.coverage - backward.coverage).abs() < 1e-12);
        prop_assert!((forward.bert_f1 - backward.bert_f1).abs() < 1e-12);
        prop_assert!((forward.partial - backward.partial).abs() < 1e-12);
    }
}
