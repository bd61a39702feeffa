//! Span Eval - embedding-based scoring of candidate text against gold spans.
//!
//! Instead of counting exact token overlap, every comparison embeds text
//! with a dense embedding model and measures cosine similarity. Three
//! metrics are provided:
//!
//! 1. **Semantic coverage**: how well the whole candidate matches each gold span
//! 2. **BERT-style F1**: sentence-level best-match alignment in both directions
//! 3. **Partial correctness**: how well each gold span is supported by its
//!    best candidate sentence
//!
//! # Quick Start
//!
//! ```
//! use span_eval::{HashingEmbedder, Scorer};
//!
//! let provider = HashingEmbedder::default();
//! let scorer = Scorer::new(&provider);
//!
//! let gold = ["The sky is blue."];
//! let candidate = "The sky appears blue during the day.";
//!
//! let coverage = scorer.semantic_coverage(&gold, candidate)?;
//! let bert_f1 = scorer.bertscore_style(&gold.join(" "), candidate)?;
//! let partial = scorer.partial_correctness(&gold, candidate)?;
//!
//! assert!(coverage > 0.5 && partial > 0.5);
//! assert!((bert_f1 - coverage).abs() < 1e-6);
//! # Ok::<(), span_eval::SpanEvalError>(())
//! ```
//!
//! # Architecture
//!
//! - **text**: sentence segmentation and candidate-text assembly
//! - **similarity**: ε-guarded cosine similarity matrix
//! - **embedding**: the `EmbeddingProvider` trait and its backends
//! - **scorer**: the three metrics
//! - **dataset / evaluate / report**: the dataset-driven evaluation loop and its table

pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod evaluate;
pub mod report;
pub mod scorer;
pub mod similarity;
pub mod text;

// Re-export commonly used types
pub use config::{Backend, Config, EmbeddingConfig};
pub use dataset::{Dataset, DatasetItem, create_sample_dataset, load_dataset};
pub use embedding::{
    CachedEmbedder, Embedding, EmbeddingProvider, HashingEmbedder, create_provider,
};
pub use error::{Result, SpanEvalError};
pub use evaluate::{Evaluation, EvaluationConfig};
pub use report::{EvaluationReport, ItemScores, MetricAverages};
pub use scorer::Scorer;
pub use similarity::{NORM_EPSILON, SimilarityMatrix, cosine_similarity};
pub use text::{join_passages, split_sentences};

#[cfg(feature = "model")]
pub use embedding::BertEmbedder;
