//! Embedding providers.
//!
//! The scorer only depends on the [`EmbeddingProvider`] capability: an
//! ordered batch of strings in, one fixed-dimension vector per string out.
//! Backends:
//! - [`HashingEmbedder`]: deterministic token-hashing vectors, no model needed
//! - [`CachedEmbedder`]: memoizing wrapper around any other provider
//! - `BertEmbedder` (feature `model`): sentence-transformers checkpoints via candle

pub mod cache;
pub mod hashing;
#[cfg(feature = "model")]
pub mod model;

pub use cache::CachedEmbedder;
pub use hashing::HashingEmbedder;
#[cfg(feature = "model")]
pub use model::BertEmbedder;

use crate::config::{Backend, EmbeddingConfig};
use crate::error::Result;

/// A single embedding vector.
pub type Embedding = Vec<f32>;

/// Maps text to fixed-dimension vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// and an empty batch for empty input. All vectors share [`dimension`].
/// Identical inputs are not required to be cached.
///
/// [`dimension`]: EmbeddingProvider::dimension
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Dimension of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Short human-readable name (model id or backend name).
    fn name(&self) -> &str;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        (**self).embed(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Create the provider described by `config`.
///
/// A zero hashing dimension is rejected with
/// [`SpanEvalError::InvalidConfig`](crate::SpanEvalError::InvalidConfig).
/// Loading a model backend can fail (download, weights, tokenizer); that is
/// reported as [`SpanEvalError::ModelLoad`](crate::SpanEvalError::ModelLoad).
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let provider: Box<dyn EmbeddingProvider> = match config.backend {
        Backend::Hashing => Box::new(HashingEmbedder::try_new(config.dimension)?),
        #[cfg(feature = "model")]
        Backend::Model => Box::new(BertEmbedder::load(config)?),
        #[cfg(not(feature = "model"))]
        Backend::Model => {
            return Err(crate::error::SpanEvalError::InvalidConfig(
                "the model backend requires building with the `model` feature".to_string(),
            ));
        }
    };

    if config.cache {
        Ok(Box::new(CachedEmbedder::new(provider)))
    } else {
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hashing_provider() {
        let config = EmbeddingConfig {
            dimension: 64,
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.dimension(), 64);
        assert_eq!(provider.name(), "hashing");

        let vectors = provider.embed(&["one", "two"]).unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 64));
    }

    #[test]
    fn test_create_cached_provider() {
        let config = EmbeddingConfig {
            cache: true,
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "hashing");
        assert!(provider.embed(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_zero_dimension_is_a_config_error() {
        let config = EmbeddingConfig {
            dimension: 0,
            ..Default::default()
        };
        let result = create_provider(&config);
        assert!(matches!(
            result,
            Err(crate::error::SpanEvalError::InvalidConfig(_))
        ));

        let cached = EmbeddingConfig {
            dimension: 0,
            cache: true,
            ..Default::default()
        };
        assert!(create_provider(&cached).is_err());
    }

    #[cfg(not(feature = "model"))]
    #[test]
    fn test_model_backend_requires_feature() {
        let config = EmbeddingConfig {
            backend: Backend::Model,
            ..Default::default()
        };
        assert!(create_provider(&config).is_err());
    }
}
