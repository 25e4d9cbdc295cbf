//! Gyeyak Storage Layer
//!
//! Embedding backends, the LRU embedding cache, and the vector store
//! gateway. The gateway is a thin contract over an external k-nearest
//! cosine index; two implementations ship here:
//!
//! - `InMemoryVectorStore` — cosine scan over in-process vectors, used
//!   by tests and offline runs
//! - `RemoteVectorStore` — REST client for a Qdrant-class store
//!
//! # Examples
//!
//! ```
//! use gyeyak_store::{Embedder, HashEmbedder};
//!
//! let embedder = HashEmbedder::new(384);
//! let vectors = embedder.encode(&["근로계약".to_string()]).unwrap();
//! assert_eq!(vectors[0].len(), 384);
//! ```

#![warn(clippy::all)]

pub mod cache;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod remote;

pub use cache::EmbeddingCache;
pub use embedding::{cosine_similarity, normalize, Embedder, HashEmbedder, HttpEmbedder};
pub use error::{EmbedError, StoreError};
pub use gateway::{
    ContractHit, ContractPoint, LegalHit, LegalPoint, VectorStore, DEFAULT_BOOST_FACTOR,
};
pub use memory::InMemoryVectorStore;
pub use remote::RemoteVectorStore;
