//! LRU-bounded embedding cache
//!
//! A process-wide mapping from text to vector, in front of a
//! batch-capable encoder. Hits promote to most-recently-used; inserts
//! past capacity evict the least-recently-used entry. All LRU
//! bookkeeping happens under one mutex and no lock is held across an
//! await: encoding runs in `spawn_blocking` between two short critical
//! sections.

use crate::embedding::{normalize, Embedder, MAX_ENCODE_BATCH};
use crate::error::EmbedError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

struct LruInner {
    map: HashMap<String, Vec<f32>>,
    order: VecDeque<String>,
}

impl LruInner {
    fn get(&mut self, key: &str) -> Option<Vec<f32>> {
        let vector = self.map.get(key)?.clone();
        // Promote to most-recently-used
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
        Some(vector)
    }

    fn put(&mut self, key: String, vector: Vec<f32>, max_size: usize) {
        if self.map.insert(key.clone(), vector).is_none() {
            self.order.push_back(key);
        } else {
            self.order.retain(|k| k != &key);
            self.order.push_back(key);
        }
        while self.map.len() > max_size {
            if let Some(evicted) = self.order.pop_front() {
                self.map.remove(&evicted);
            } else {
                break;
            }
        }
    }
}

/// Bounded text → vector cache over a batch-capable encoder
pub struct EmbeddingCache {
    embedder: Arc<dyn Embedder>,
    inner: Mutex<LruInner>,
    max_size: usize,
}

impl EmbeddingCache {
    /// Wrap `embedder` with an LRU of `max_size` entries
    pub fn new(embedder: Arc<dyn Embedder>, max_size: usize) -> Self {
        Self {
            embedder,
            inner: Mutex::new(LruInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            max_size: max_size.max(1),
        }
    }

    /// Output dimension of the wrapped encoder
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cache keys are namespaced by the encoder's model identity so a
    /// model swap never serves stale vectors.
    fn key(&self, text: &str) -> String {
        format!("{}::{}", self.embedder.model_id(), text)
    }

    /// Embed one text
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_many(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::Backend("encoder returned an empty batch".to_string()))
    }

    /// Embed a batch, computing only the uncached subset in bounded
    /// encoder calls and reassembling results in the caller's order.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // First critical section: collect hits, dedupe misses
        let mut resolved: HashMap<String, Vec<f32>> = HashMap::new();
        let mut misses: Vec<String> = Vec::new();
        {
            let mut inner = self.inner.lock().unwrap();
            for text in texts {
                if resolved.contains_key(text) || misses.contains(text) {
                    continue;
                }
                match inner.get(&self.key(text)) {
                    Some(vector) => {
                        resolved.insert(text.clone(), vector);
                    }
                    None => misses.push(text.clone()),
                }
            }
        }
        debug!(
            total = texts.len(),
            hits = resolved.len(),
            misses = misses.len(),
            "Embedding batch"
        );

        // Encode the misses off the scheduler, in bounded batches
        for batch in misses.chunks(MAX_ENCODE_BATCH) {
            let embedder = Arc::clone(&self.embedder);
            let owned: Vec<String> = batch.to_vec();
            let encoded = tokio::task::spawn_blocking(move || embedder.encode(&owned))
                .await
                .map_err(|e| EmbedError::Backend(format!("encoder task failed: {}", e)))??;

            let mut inner = self.inner.lock().unwrap();
            for (text, mut vector) in batch.iter().zip(encoded) {
                normalize(&mut vector);
                inner.put(self.key(text), vector.clone(), self.max_size);
                resolved.insert(text.clone(), vector);
            }
        }

        // Reassemble in caller order
        Ok(texts
            .iter()
            .map(|text| resolved.get(text).cloned().unwrap_or_default())
            .collect())
    }
}
