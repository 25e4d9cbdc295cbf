//! Remote vector store client
//!
//! REST client for a Qdrant-class k-NN store. Collections are created
//! idempotently at startup; point ids are derived deterministically
//! from `(external_id, chunk_index)` so re-ingestion overwrites instead
//! of duplicating. Search-side transport failures degrade to an empty
//! result and a warning; ingestion failures propagate.

use crate::error::StoreError;
use crate::gateway::{ContractHit, ContractPoint, LegalHit, LegalPoint, VectorStore};
use async_trait::async_trait;
use gyeyak_domain::{ContractChunk, DocumentId, LegalChunk};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Collection holding the external legal corpus
pub const LEGAL_COLLECTION: &str = "legal-chunks";
/// Collection holding per-document contract chunks
pub const CONTRACT_COLLECTION: &str = "contract-chunks";
/// Collection reserved for team profile embeddings
pub const TEAM_COLLECTION: &str = "team-embeddings";

/// REST client over a remote k-NN store
pub struct RemoteVectorStore {
    base_url: String,
    dimension: usize,
    client: reqwest::Client,
}

impl RemoteVectorStore {
    /// Create a client for `base_url` (e.g. `http://localhost:6333`)
    pub fn new(
        base_url: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("client build failed: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dimension,
            client,
        })
    }

    fn collection_url(&self, collection: &str, suffix: &str) -> String {
        format!("{}/collections/{}{}", self.base_url, collection, suffix)
    }

    async fn create_collection(&self, collection: &str) -> Result<(), StoreError> {
        let body = json!({
            "vectors": { "size": self.dimension, "distance": "Cosine" }
        });
        let response = self
            .client
            .put(self.collection_url(collection, ""))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::MissingCollection(format!("{}: {}", collection, e)))?;

        // 409 means the collection already exists, which is fine
        if response.status().is_success() || response.status() == reqwest::StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(StoreError::MissingCollection(format!(
                "{}: HTTP {}",
                collection,
                response.status()
            )))
        }
    }

    async fn upsert_points(&self, collection: &str, points: Vec<Value>) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .put(self.collection_url(collection, "/points?wait=true"))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| StoreError::Ingestion(format!("{}: {}", collection, e)))?;
        if !response.status().is_success() {
            return Err(StoreError::Ingestion(format!(
                "{}: HTTP {}",
                collection,
                response.status()
            )));
        }
        Ok(())
    }

    /// Run a filtered search; transport errors come back as `None` so
    /// callers can degrade to an empty result.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<Value>,
    ) -> Option<Vec<(f32, Value)>> {
        let mut body = json!({
            "vector": embedding,
            "limit": k,
            "with_payload": true,
        });
        if let Some(filter) = filter {
            body["filter"] = filter;
        }
        let result = self
            .client
            .post(self.collection_url(collection, "/points/search"))
            .json(&body)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(collection, status = %response.status(), "Vector search failed");
                return None;
            }
            Err(e) => {
                warn!(collection, error = %e, "Vector store unreachable");
                return None;
            }
        };

        let parsed: Value = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(collection, error = %e, "Undecodable search response");
                return None;
            }
        };

        let rows = parsed["result"].as_array()?.clone();
        Some(
            rows.into_iter()
                .filter_map(|row| {
                    let score = row["score"].as_f64()? as f32;
                    let payload = row.get("payload")?.clone();
                    Some((score, payload))
                })
                .collect(),
        )
    }
}

fn legal_point_id(chunk: &LegalChunk) -> String {
    let name = format!("legal:{}:{}", chunk.external_id, chunk.chunk_index);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

fn contract_point_id(chunk: &ContractChunk) -> String {
    let name = format!("contract:{}:{}", chunk.document_id, chunk.chunk_index);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Translate the flat filter map into the store's filter clause.
/// Metadata keys live under the `metadata.` payload prefix; the
/// reserved `source_type` key addresses the typed field directly.
fn legal_filter(filters: &HashMap<String, String>) -> Option<Value> {
    if filters.is_empty() {
        return None;
    }
    let must: Vec<Value> = filters
        .iter()
        .map(|(key, value)| {
            let path = if key == "source_type" {
                key.clone()
            } else {
                format!("metadata.{}", key)
            };
            json!({ "key": path, "match": { "value": value } })
        })
        .collect();
    Some(json!({ "must": must }))
}

#[async_trait]
impl VectorStore for RemoteVectorStore {
    async fn ensure_collections(&self) -> Result<(), StoreError> {
        for collection in [LEGAL_COLLECTION, CONTRACT_COLLECTION, TEAM_COLLECTION] {
            self.create_collection(collection).await?;
        }
        info!(base_url = %self.base_url, "Vector store collections ready");
        Ok(())
    }

    async fn upsert_legal(&self, points: Vec<LegalPoint>) -> Result<usize, StoreError> {
        let count = points.len();
        let body: Vec<Value> = points
            .iter()
            .map(|point| {
                json!({
                    "id": legal_point_id(&point.chunk),
                    "vector": point.embedding,
                    "payload": serde_json::to_value(&point.chunk).unwrap_or(Value::Null),
                })
            })
            .collect();
        self.upsert_points(LEGAL_COLLECTION, body).await?;
        Ok(count)
    }

    async fn upsert_contract(
        &self,
        document_id: DocumentId,
        points: Vec<ContractPoint>,
    ) -> Result<(), StoreError> {
        // Delete-then-insert replacement: the store has no transactions
        let delete_body = json!({
            "filter": {
                "must": [{ "key": "document_id", "match": { "value": document_id.to_string() } }]
            }
        });
        let response = self
            .client
            .post(self.collection_url(CONTRACT_COLLECTION, "/points/delete?wait=true"))
            .json(&delete_body)
            .send()
            .await
            .map_err(|e| StoreError::Ingestion(format!("delete failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(StoreError::Ingestion(format!(
                "delete failed: HTTP {}",
                response.status()
            )));
        }

        let body: Vec<Value> = points
            .iter()
            .map(|point| {
                json!({
                    "id": contract_point_id(&point.chunk),
                    "vector": point.embedding,
                    "payload": serde_json::to_value(&point.chunk).unwrap_or(Value::Null),
                })
            })
            .collect();
        self.upsert_points(CONTRACT_COLLECTION, body).await
    }

    async fn search_legal(
        &self,
        embedding: &[f32],
        k: usize,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<LegalHit>, StoreError> {
        let Some(rows) = self
            .search(LEGAL_COLLECTION, embedding, k, legal_filter(filters))
            .await
        else {
            return Ok(Vec::new());
        };
        Ok(rows
            .into_iter()
            .filter_map(|(score, payload)| {
                let chunk: LegalChunk = serde_json::from_value(payload).ok()?;
                Some(LegalHit { chunk, score })
            })
            .collect())
    }

    async fn search_contract(
        &self,
        document_id: DocumentId,
        embedding: &[f32],
        k: usize,
        boost_article: Option<u32>,
        boost_factor: f32,
    ) -> Result<Vec<ContractHit>, StoreError> {
        let filter = json!({
            "must": [{ "key": "document_id", "match": { "value": document_id.to_string() } }]
        });
        // Over-fetch when boosting so a boosted row outside the raw
        // top-k can still make the cut
        let fetch_k = if boost_article.is_some() { k + 10 } else { k };
        let Some(rows) = self
            .search(CONTRACT_COLLECTION, embedding, fetch_k, Some(filter))
            .await
        else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<ContractHit> = rows
            .into_iter()
            .filter_map(|(score, payload)| {
                let chunk: ContractChunk = serde_json::from_value(payload).ok()?;
                let mut score = score;
                if boost_article.is_some() && chunk.article_number == boost_article {
                    score *= boost_factor;
                }
                Some(ContractHit { chunk, score })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}
