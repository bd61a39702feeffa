//! Evaluation results and the console report.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Width of the horizontal rules in the table.
const RULE_WIDTH: usize = 52;

/// The three scores for one dataset item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemScores {
    /// Item ID.
    pub id: String,
    /// Semantic coverage.
    pub coverage: f64,
    /// BERT-style best-match F1.
    pub bert_f1: f64,
    /// Partial correctness.
    pub partial: f64,
}

/// Column means over all items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricAverages {
    pub coverage: f64,
    pub bert_f1: f64,
    pub partial: f64,
}

impl MetricAverages {
    /// Arithmetic mean of each metric; all zero for no rows.
    pub fn from_rows(rows: &[ItemScores]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        Self {
            coverage: rows.iter().map(|r| r.coverage).sum::<f64>() / n,
            bert_f1: rows.iter().map(|r| r.bert_f1).sum::<f64>() / n,
            partial: rows.iter().map(|r| r.partial).sum::<f64>() / n,
        }
    }
}

/// Aggregated evaluation results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Dataset name.
    pub dataset_name: String,
    /// Embedding provider name.
    pub provider: String,
    /// Per-item scores, in evaluation order.
    pub rows: Vec<ItemScores>,
    /// Mean of each metric column.
    pub average: MetricAverages,
    /// Total evaluation time (seconds).
    pub total_time_secs: f64,
}

impl EvaluationReport {
    /// Create empty results.
    pub fn new(dataset_name: &str, provider: &str) -> Self {
        Self {
            dataset_name: dataset_name.to_string(),
            provider: provider.to_string(),
            rows: Vec::new(),
            average: MetricAverages::default(),
            total_time_secs: 0.0,
        }
    }

    /// Recompute the averages from the rows.
    pub fn calculate_summary(&mut self) {
        self.average = MetricAverages::from_rows(&self.rows);
    }

    /// Render the fixed-width score table.
    ///
    /// ```text
    /// QueryID | Coverage |  BERT-F1 |  Partial
    /// ----------------------------------------------------
    /// Q1     |    0.812 |    0.640 |    0.701
    /// ----------------------------------------------------
    /// AVERAGE |    0.812 |    0.640 |    0.701
    /// ```
    pub fn format_table(&self) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{:<6} | {:>8} | {:>8} | {:>8}",
            "QueryID", "Coverage", "BERT-F1", "Partial"
        );
        let _ = writeln!(out, "{}", rule);
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:<6} | {:8.3} | {:8.3} | {:8.3}",
                row.id, row.coverage, row.bert_f1, row.partial
            );
        }
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "{:<6} | {:8.3} | {:8.3} | {:8.3}",
            "AVERAGE", self.average.coverage, self.average.bert_f1, self.average.partial
        );

        out
    }

    /// Print the table to stdout.
    pub fn print_table(&self) {
        print!("{}", self.format_table());
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
