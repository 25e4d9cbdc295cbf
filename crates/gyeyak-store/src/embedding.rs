//! Embedding backends
//!
//! The `Embedder` trait is synchronous: encoding is CPU-bound (or a
//! blocking HTTP call) and is offloaded by the cache with
//! `spawn_blocking`, keeping the async scheduler free.

use crate::error::EmbedError;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Maximum batch handed to a backend in one call
pub const MAX_ENCODE_BATCH: usize = 64;

/// A batch-capable text-to-vector encoder.
///
/// Implementations must be deterministic: identical input produces an
/// identical vector within a process.
pub trait Embedder: Send + Sync {
    /// Identity of the underlying model; cache keys are namespaced by
    /// this so a model swap cold-starts the cache
    fn model_id(&self) -> &str;

    /// Fixed output dimension
    fn dimension(&self) -> usize;

    /// Encode a batch of texts, preserving order
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Deterministic hash-seeded embedder for tests and offline runs.
///
/// Vectors are unit-length and diverse across inputs; they carry no
/// semantics, which is exactly what deterministic pipeline tests want.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a hash embedder with the given dimension
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_with_seed(text: &str, seed: u64) -> f32 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        seed.hash(&mut hasher);
        let hash_value = hasher.finish();
        ((hash_value as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32
    }
}

impl Embedder for HashEmbedder {
    fn model_id(&self) -> &str {
        "hash-embedder"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        texts
            .iter()
            .map(|text| {
                if text.is_empty() {
                    return Err(EmbedError::InvalidInput(
                        "Empty text cannot be embedded".to_string(),
                    ));
                }
                let mut vector: Vec<f32> = (0..self.dimension)
                    .map(|i| Self::hash_with_seed(text, i as u64))
                    .collect();
                normalize(&mut vector);
                Ok(vector)
            })
            .collect()
    }
}

/// HTTP embedding backend speaking the Ollama `/api/embed` shape.
///
/// Uses a blocking client on purpose: the cache runs `encode` inside
/// `spawn_blocking`.
pub struct HttpEmbedder {
    endpoint: String,
    model: String,
    dimension: usize,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbedder {
    /// Create a client for `endpoint` (e.g. `http://localhost:11434`)
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbedError::Backend(format!("client build failed: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            dimension,
            client,
        })
    }
}

impl Embedder for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let url = format!("{}/api/embed", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|e| EmbedError::Backend(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EmbedError::Backend(format!(
                "HTTP {} from embedding backend",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| EmbedError::Backend(format!("bad response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbedError::Backend(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}

/// Scale a vector to unit L2 length in place. Zero vectors are left
/// unchanged.
pub fn normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// Cosine similarity between two vectors of equal length
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(384);
        let texts = vec!["근로기준법 제56조".to_string()];
        let first = embedder.encode(&texts).unwrap();
        let second = embedder.encode(&texts).unwrap();
        assert_eq!(first, second, "same text must produce bit-identical vectors");
    }

    #[test]
    fn hash_embedder_vectors_are_unit_norm() {
        let embedder = HashEmbedder::new(384);
        let vectors = embedder.encode(&["연장근로 수당".to_string()]).unwrap();
        let magnitude: f32 = vectors[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
    }

    #[test]
    fn hash_embedder_rejects_empty_text() {
        let embedder = HashEmbedder::new(16);
        let result = embedder.encode(&[String::new()]);
        assert!(matches!(result, Err(EmbedError::InvalidInput(_))));
    }

    #[test]
    fn different_texts_differ() {
        let embedder = HashEmbedder::new(384);
        let vectors = embedder
            .encode(&["임금".to_string(), "수습".to_string()])
            .unwrap();
        assert_ne!(vectors[0], vectors[1]);
    }

    #[test]
    fn cosine_similarity_bounds() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-4);
        assert!(cosine_similarity(&a, &b).abs() < 1e-4);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-4);
    }

    #[test]
    fn cosine_similarity_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut v = vec![0.0f32; 4];
        normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }
}
