//! Gyeyak Analysis Engine
//!
//! The retrieval-and-analysis core for Korean employment and freelance
//! contracts. Given extracted contract text, the engine chunks it along
//! article boundaries, retrieves supporting corpus excerpts from two
//! sources, drives an LLM through a strict JSON contract, and produces
//! a grounded risk report. Ad-hoc situation analysis and grounded chat
//! reuse the same retrieval layer.
//!
//! The `Engine` value owns every shared component — embedding cache,
//! vector store gateway, LLM client — and is assembled once at startup.

#![warn(clippy::all)]

pub mod analysis;
pub mod chat;
pub mod error;
pub mod parser;
pub mod patterns;
pub mod prompt;
pub mod retrieval;
pub mod situation;

pub use chat::ChatRequest;
pub use error::EngineError;
pub use retrieval::Retriever;

use gyeyak_domain::{EngineConfig, LegalChunk};
use gyeyak_extract::{ArticleChunker, TextExtractor};
use gyeyak_llm::LlmClient;
use gyeyak_store::{Embedder, EmbeddingCache, LegalPoint, VectorStore};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::info;

/// The assembled analysis engine
pub struct Engine {
    config: EngineConfig,
    extractor: Arc<TextExtractor>,
    chunker: ArticleChunker,
    cache: Arc<EmbeddingCache>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    retriever: Retriever,
}

impl Engine {
    /// Assemble an engine from its collaborators
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let cache = Arc::new(EmbeddingCache::new(embedder, config.embedding_cache_size));
        let retriever = Retriever::new(Arc::clone(&cache), Arc::clone(&store), config.clone());
        Self {
            config,
            extractor: Arc::new(TextExtractor::new()),
            chunker: ArticleChunker::new(),
            cache,
            store,
            llm,
            retriever,
        }
    }

    /// Replace the default extractor (e.g. to attach an OCR engine)
    pub fn with_extractor(mut self, extractor: TextExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Verify the vector store collections exist. A failure here is
    /// fatal at startup, never deferred to query time.
    pub async fn startup_check(&self) -> Result<(), EngineError> {
        self.store
            .ensure_collections()
            .await
            .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
        info!("Engine startup check passed");
        Ok(())
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The retrieval front-end (shared with chat and situation flows)
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Embed and ingest legal corpus chunks. Unlike contract-chunk
    /// ingestion, failures here propagate: a broken corpus write must
    /// not pass silently. Returns the number of new chunks accepted.
    pub async fn ingest_legal_corpus(&self, chunks: Vec<LegalChunk>) -> Result<usize, EngineError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self
            .cache
            .embed_many(&texts)
            .await
            .map_err(|e| EngineError::Embedding(e.to_string()))?;
        let points: Vec<LegalPoint> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| LegalPoint { chunk, embedding })
            .collect();

        match timeout(self.config.vector_timeout(), self.store.upsert_legal(points)).await {
            Ok(Ok(inserted)) => {
                info!(inserted, "Legal corpus ingestion complete");
                Ok(inserted)
            }
            Ok(Err(e)) => Err(EngineError::Ingestion(e.to_string())),
            Err(_) => Err(EngineError::Ingestion("vector store timed out".to_string())),
        }
    }
}
