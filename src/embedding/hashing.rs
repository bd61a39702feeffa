//! Deterministic token-hashing embedder.
//!
//! Each lowercased token is hashed with xxh3 into one of `dimension`
//! buckets and the bucket counts are L2 normalized. xxh3 output is fixed by
//! its definition, so a given text maps to the same vector on every
//! platform and toolchain. Texts that share vocabulary get high cosine
//! similarity; texts with no tokens map to the zero vector. Useful for tests
//! and for runs without model weights.

use super::{Embedding, EmbeddingProvider};
use crate::error::{Result, SpanEvalError};
use xxhash_rust::xxh3::xxh3_64;

/// Default number of hash buckets, matching all-MiniLM-L6-v2's width.
pub const DEFAULT_DIMENSION: usize = 384;

/// Bag-of-words embedder over hashed tokens.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder with `dimension` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is zero. Use [`HashingEmbedder::try_new`] for
    /// dimensions that come from configuration.
    pub fn new(dimension: usize) -> Self {
        match Self::try_new(dimension) {
            Ok(embedder) => embedder,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create an embedder with `dimension` buckets, rejecting zero.
    pub fn try_new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(SpanEvalError::InvalidConfig(
                "hashing embedder needs at least one bucket".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, token: &str) -> usize {
        (xxh3_64(token.to_lowercase().as_bytes()) % self.dimension as u64) as usize
    }

    /// Generate the embedding for one text.
    fn generate_embedding(&self, text: &str) -> Embedding {
        let mut embedding = vec![0.0; self.dimension];

        let tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|s| !s.is_empty())
            .collect();

        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            embedding[self.bucket(token)] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in embedding.iter_mut() {
                *val /= norm;
            }
        }

        embedding
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.generate_embedding(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn test_hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed(&["Loamy soil drains well"]).unwrap();
        let b = embedder.embed(&["Loamy soil drains well"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 128);
    }

    #[test]
    fn test_hashing_embedder_is_case_and_punctuation_insensitive() {
        let embedder = HashingEmbedder::default();
        let vectors = embedder
            .embed(&["The sky is blue.", "the SKY, is blue"])
            .unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }

    #[test]
    fn test_hashing_embedder_unit_norm() {
        let embedder = HashingEmbedder::default();
        let vectors = embedder.embed(&["compost and mulch"]).unwrap();
        let norm: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let vectors = embedder.embed(&["", " ... "]).unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.iter().all(|&x| x == 0.0)));
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        assert!(matches!(
            HashingEmbedder::try_new(0),
            Err(SpanEvalError::InvalidConfig(_))
        ));
        assert_eq!(HashingEmbedder::try_new(8).unwrap().dimension(), 8);
    }

    #[test]
    fn test_single_token_lands_in_its_xxh3_bucket() {
        let embedder = HashingEmbedder::new(16);
        let vector = &embedder.embed(&["Sky"]).unwrap()[0];
        let bucket = (xxh3_64(b"sky") % 16) as usize;

        assert_eq!(vector[bucket], 1.0);
        assert_eq!(vector.iter().filter(|&&x| x != 0.0).count(), 1);
    }

    #[test]
    fn test_repeated_tokens_weigh_by_count() {
        let embedder = HashingEmbedder::new(1024);
        let a = (xxh3_64(b"weed") % 1024) as usize;
        let b = (xxh3_64(b"water") % 1024) as usize;

        let vector = &embedder.embed(&["weed weed water"]).unwrap()[0];
        if a == b {
            assert!((vector[a] - 1.0).abs() < 1e-6);
        } else {
            let norm = 5f32.sqrt();
            assert!((vector[a] - 2.0 / norm).abs() < 1e-6);
            assert!((vector[b] - 1.0 / norm).abs() < 1e-6);
        }
    }

    #[test]
    fn test_hashing_embedder_empty_batch() {
        let embedder = HashingEmbedder::default();
        assert!(embedder.embed(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::default();
        let v = embedder
            .embed(&[
                "rotate crops every year",
                "rotate your crops each year",
                "chocolate cake recipe",
            ])
            .unwrap();
        let related = cosine_similarity(&v[0], &v[1]).unwrap();
        let unrelated = cosine_similarity(&v[0], &v[2]).unwrap();
        assert!(related > unrelated);
    }
}
