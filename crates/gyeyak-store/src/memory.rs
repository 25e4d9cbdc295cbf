//! In-memory vector store — cosine scan for tests and offline runs

use crate::embedding::cosine_similarity;
use crate::error::StoreError;
use crate::gateway::{
    legal_chunk_matches, ContractHit, ContractPoint, LegalHit, LegalPoint, VectorStore,
};
use async_trait::async_trait;
use gyeyak_domain::DocumentId;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::debug;

/// Process-local implementation of the vector store gateway
#[derive(Default)]
pub struct InMemoryVectorStore {
    legal: RwLock<Vec<LegalPoint>>,
    contracts: RwLock<HashMap<DocumentId, Vec<ContractPoint>>>,
}

impl InMemoryVectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of legal points held
    pub fn legal_len(&self) -> usize {
        self.legal.read().unwrap().len()
    }

    /// Number of chunks held for a document
    pub fn contract_len(&self, document_id: DocumentId) -> usize {
        self.contracts
            .read()
            .unwrap()
            .get(&document_id)
            .map(|points| points.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collections(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_legal(&self, points: Vec<LegalPoint>) -> Result<usize, StoreError> {
        let mut legal = self.legal.write().unwrap();
        let existing: HashSet<String> = legal
            .iter()
            .map(|p| p.chunk.external_id.clone())
            .collect();

        let mut seen_in_batch: HashSet<(String, usize)> = HashSet::new();
        let mut inserted = 0;
        for point in points {
            // Re-ingestion of a known file is a no-op
            if existing.contains(&point.chunk.external_id) {
                continue;
            }
            let key = (point.chunk.external_id.clone(), point.chunk.chunk_index);
            if !seen_in_batch.insert(key) {
                continue;
            }
            legal.push(point);
            inserted += 1;
        }
        debug!(inserted, total = legal.len(), "Upserted legal chunks");
        Ok(inserted)
    }

    async fn upsert_contract(
        &self,
        document_id: DocumentId,
        points: Vec<ContractPoint>,
    ) -> Result<(), StoreError> {
        let mut contracts = self.contracts.write().unwrap();
        contracts.insert(document_id, points);
        Ok(())
    }

    async fn search_legal(
        &self,
        embedding: &[f32],
        k: usize,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<LegalHit>, StoreError> {
        let legal = self.legal.read().unwrap();
        let mut hits: Vec<LegalHit> = legal
            .iter()
            .filter(|point| legal_chunk_matches(&point.chunk, filters))
            .map(|point| LegalHit {
                chunk: point.chunk.clone(),
                score: cosine_similarity(embedding, &point.embedding),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn search_contract(
        &self,
        document_id: DocumentId,
        embedding: &[f32],
        k: usize,
        boost_article: Option<u32>,
        boost_factor: f32,
    ) -> Result<Vec<ContractHit>, StoreError> {
        let contracts = self.contracts.read().unwrap();
        let Some(points) = contracts.get(&document_id) else {
            return Ok(Vec::new());
        };
        let mut hits: Vec<ContractHit> = points
            .iter()
            .map(|point| {
                let mut score = cosine_similarity(embedding, &point.embedding);
                if boost_article.is_some() && point.chunk.article_number == boost_article {
                    score *= boost_factor;
                }
                ContractHit {
                    chunk: point.chunk.clone(),
                    score,
                }
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyeyak_domain::{ContractChunk, LegalChunk, SourceType};

    fn legal_point(external_id: &str, chunk_index: usize, embedding: Vec<f32>) -> LegalPoint {
        LegalPoint {
            chunk: LegalChunk {
                external_id: external_id.to_string(),
                chunk_index,
                source_type: SourceType::Law,
                title: "근로기준법".to_string(),
                content: "본문".to_string(),
                file_path: None,
                metadata: HashMap::new(),
            },
            embedding,
        }
    }

    fn contract_point(
        document_id: DocumentId,
        chunk_index: usize,
        article: Option<u32>,
        embedding: Vec<f32>,
    ) -> ContractPoint {
        ContractPoint {
            chunk: ContractChunk {
                document_id,
                article_number: article,
                paragraph_index: Some(0),
                content: "조항".to_string(),
                chunk_index,
                metadata: HashMap::new(),
            },
            embedding,
        }
    }

    #[tokio::test]
    async fn reingesting_same_external_id_is_a_noop() {
        let store = InMemoryVectorStore::new();
        let points = vec![
            legal_point("file-a", 0, vec![1.0, 0.0]),
            legal_point("file-a", 1, vec![0.0, 1.0]),
        ];
        assert_eq!(store.upsert_legal(points.clone()).await.unwrap(), 2);
        assert_eq!(store.upsert_legal(points).await.unwrap(), 0);
        assert_eq!(store.legal_len(), 2);
    }

    #[tokio::test]
    async fn search_on_empty_corpus_returns_nothing() {
        let store = InMemoryVectorStore::new();
        let hits = store.search_legal(&[1.0, 0.0], 5, &HashMap::new()).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = InMemoryVectorStore::new();
        store
            .upsert_legal(vec![
                legal_point("far", 0, vec![0.0, 1.0]),
                legal_point("near", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();
        let hits = store.search_legal(&[1.0, 0.0], 2, &HashMap::new()).await.unwrap();
        assert_eq!(hits[0].chunk.external_id, "near");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn contract_upsert_replaces_previous_chunks() {
        let store = InMemoryVectorStore::new();
        let doc = DocumentId::new();
        store
            .upsert_contract(doc, vec![contract_point(doc, 0, Some(1), vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert_contract(
                doc,
                vec![
                    contract_point(doc, 0, Some(1), vec![1.0, 0.0]),
                    contract_point(doc, 1, Some(2), vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(store.contract_len(doc), 2);
    }

    #[tokio::test]
    async fn article_boost_reorders_results() {
        let store = InMemoryVectorStore::new();
        let doc = DocumentId::new();
        // Article 2 is slightly less similar but gets boosted past article 1
        store
            .upsert_contract(
                doc,
                vec![
                    contract_point(doc, 0, Some(1), vec![1.0, 0.0]),
                    contract_point(doc, 1, Some(2), vec![0.9, 0.435]),
                ],
            )
            .await
            .unwrap();

        let plain = store
            .search_contract(doc, &[1.0, 0.0], 2, None, 1.5)
            .await
            .unwrap();
        assert_eq!(plain[0].chunk.article_number, Some(1));

        let boosted = store
            .search_contract(doc, &[1.0, 0.0], 2, Some(2), 1.5)
            .await
            .unwrap();
        assert_eq!(boosted[0].chunk.article_number, Some(2));
    }

    #[tokio::test]
    async fn unknown_document_yields_empty() {
        let store = InMemoryVectorStore::new();
        let hits = store
            .search_contract(DocumentId::new(), &[1.0], 3, None, 1.5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
