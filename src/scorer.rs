//! Embedding-based similarity metrics.
//!
//! Three scores compare a candidate text against gold reference spans:
//!
//! - **Semantic coverage**: mean similarity between the whole candidate and
//!   each gold span.
//! - **BERT-style F1**: sentence-level best-match alignment in both
//!   directions, combined with a harmonic mean.
//! - **Partial correctness**: for each gold span, the similarity of its best
//!   supporting candidate sentence, averaged over spans.
//!
//! Every metric is total over its inputs. Missing gold spans or candidate
//! sentences give the documented fallback value, never an error; only a
//! failing embedding provider (or one that breaks its shape contract) does.

use crate::embedding::{Embedding, EmbeddingProvider};
use crate::error::{Result, SpanEvalError};
use crate::similarity::{SimilarityMatrix, mean};
use crate::text::split_sentences;

/// Scores candidate texts with a borrowed embedding provider.
///
/// The scorer holds no state besides the provider, so one instance can be
/// reused across any number of items.
pub struct Scorer<'a> {
    provider: &'a dyn EmbeddingProvider,
}

impl<'a> Scorer<'a> {
    /// Create a scorer over `provider`.
    pub fn new(provider: &'a dyn EmbeddingProvider) -> Self {
        Self { provider }
    }

    /// The provider used for all embeddings.
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider
    }

    /// Embed `texts`, checking the one-vector-per-input contract.
    fn embed<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Embedding>> {
        let refs: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
        let vectors = self.provider.embed(&refs)?;
        if vectors.len() != refs.len() {
            return Err(SpanEvalError::EmbeddingCount {
                expected: refs.len(),
                found: vectors.len(),
            });
        }
        Ok(vectors)
    }

    /// Mean similarity between the whole candidate and each gold span.
    ///
    /// Returns `0.0` when there are no gold spans. An empty candidate is
    /// still embedded and compared; whatever vector the provider returns for
    /// it (the zero vector included) yields a finite score.
    pub fn semantic_coverage<S: AsRef<str>>(
        &self,
        gold_spans: &[S],
        candidate_text: &str,
    ) -> Result<f64> {
        if gold_spans.is_empty() {
            return Ok(0.0);
        }

        let candidate = self.embed(&[candidate_text])?;
        let gold = self.embed(gold_spans)?;

        // m gold rows x 1 candidate column
        let sims = SimilarityMatrix::compute(&gold, &candidate)?;
        let per_span: Vec<f32> = if sims.cols() == 1 {
            sims.column(0).collect()
        } else {
            Vec::new()
        };

        Ok(mean(&per_span).unwrap_or(0.0))
    }

    /// Sentence-level best-match F1 between gold and candidate text.
    ///
    /// `gold_text` is the gold spans already joined into one string. Both
    /// texts are split into sentences; if either side has none the score is
    /// `0.0`. Of the two directions, the first averages each gold sentence's
    /// best candidate match and the second each candidate sentence's best
    /// gold match; the result is their harmonic mean, or `0.0` when both are
    /// zero.
    pub fn bertscore_style(&self, gold_text: &str, candidate_text: &str) -> Result<f64> {
        let gold_sentences = split_sentences(gold_text);
        let candidate_sentences = split_sentences(candidate_text);
        if gold_sentences.is_empty() || candidate_sentences.is_empty() {
            return Ok(0.0);
        }

        let gold = self.embed(&gold_sentences)?;
        let candidate = self.embed(&candidate_sentences)?;
        let sims = SimilarityMatrix::compute(&gold, &candidate)?;

        let gold_referenced = mean(&sims.row_max()).unwrap_or(0.0);
        let candidate_referenced = mean(&sims.col_max()).unwrap_or(0.0);

        let total = gold_referenced + candidate_referenced;
        if total == 0.0 {
            return Ok(0.0);
        }

        Ok(2.0 * gold_referenced * candidate_referenced / total)
    }

    /// Mean over gold spans of the best-matching candidate sentence.
    ///
    /// Returns `0.0` without gold spans. When the candidate has no sentence
    /// units at all, falls back to [`semantic_coverage`] on the whole text.
    ///
    /// [`semantic_coverage`]: Scorer::semantic_coverage
    pub fn partial_correctness<S: AsRef<str>>(
        &self,
        gold_spans: &[S],
        candidate_text: &str,
    ) -> Result<f64> {
        if gold_spans.is_empty() {
            return Ok(0.0);
        }

        let candidate_sentences = split_sentences(candidate_text);
        if candidate_sentences.is_empty() {
            return self.semantic_coverage(gold_spans, candidate_text);
        }

        let gold = self.embed(gold_spans)?;
        let candidate = self.embed(&candidate_sentences)?;
        let sims = SimilarityMatrix::compute(&gold, &candidate)?;
        if sims.is_empty() {
            return Ok(0.0);
        }

        Ok(mean(&sims.row_max()).unwrap_or(0.0))
    }
}
