//! Evaluation runner: scores every dataset item and aggregates the results.

use crate::dataset::{Dataset, DatasetItem};
use crate::error::Result;
use crate::report::{EvaluationReport, ItemScores};
use crate::scorer::Scorer;
use std::time::Instant;

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Default)]
pub struct EvaluationConfig {
    /// Maximum items to evaluate (for quick testing).
    pub max_items: Option<usize>,
}

/// Runs the three metrics over a dataset.
pub struct Evaluation<'a> {
    config: EvaluationConfig,
    scorer: Scorer<'a>,
}

impl<'a> Evaluation<'a> {
    /// Create a new evaluation runner.
    pub fn new(scorer: Scorer<'a>, config: EvaluationConfig) -> Self {
        Self { config, scorer }
    }

    /// Score a single dataset item.
    ///
    /// The BERT-style metric compares the gold spans joined into one text;
    /// the other two treat each span separately.
    pub fn score_item(&self, item: &DatasetItem) -> Result<ItemScores> {
        let candidate = item.candidate_text();
        let gold_text = item.gold_text();

        let coverage = self.scorer.semantic_coverage(&item.ground_truth, &candidate)?;
        let bert_f1 = self.scorer.bertscore_style(&gold_text, &candidate)?;
        let partial = self.scorer.partial_correctness(&item.ground_truth, &candidate)?;

        Ok(ItemScores {
            id: item.id.clone(),
            coverage,
            bert_f1,
            partial,
        })
    }

    /// Run the evaluation on a dataset, in dataset order.
    ///
    /// An embedding failure on any item aborts the whole run.
    pub fn run(&self, dataset: &Dataset) -> Result<EvaluationReport> {
        let start_time = Instant::now();
        let mut report = EvaluationReport::new(&dataset.name, self.scorer.provider().name());

        let items: Vec<_> = match self.config.max_items {
            Some(max) => dataset.items.iter().take(max).collect(),
            None => dataset.items.iter().collect(),
        };

        if items.is_empty() {
            tracing::warn!(dataset = %dataset.name, "dataset has no items to evaluate");
        }

        tracing::info!(
            dataset = %dataset.name,
            items = items.len(),
            provider = self.scorer.provider().name(),
            "running evaluation"
        );

        for (idx, item) in items.iter().enumerate() {
            if item.ground_truth.is_empty() {
                tracing::debug!(item = %item.id, "item has no gold spans");
            }

            let scores = self.score_item(item)?;
            tracing::debug!(
                item = %scores.id,
                position = idx + 1,
                total = items.len(),
                coverage = scores.coverage,
                bert_f1 = scores.bert_f1,
                partial = scores.partial,
                "scored item"
            );
            report.rows.push(scores);
        }

        report.total_time_secs = start_time.elapsed().as_secs_f64();
        report.calculate_summary();

        tracing::info!(
            items = report.rows.len(),
            elapsed_secs = report.total_time_secs,
            "evaluation finished"
        );

        Ok(report)
    }
}
