// In-process brute-force vector index
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::info;

use crate::corpus::StyleEntry;
use crate::embedding::EmbeddingClient;
use crate::errors::Result;
use crate::rag::scoring::cosine_similarity;
use crate::vector_db::index::{VectorHit, VectorIndex, VectorQuery};

struct IndexedPoint {
    id: String,
    vector: Vec<f32>,
    payload: HashMap<String, JsonValue>,
}

/// Exhaustive cosine search over vectors held in memory.
///
/// Serves one collection; queries naming another collection get no hits.
pub struct InMemoryVectorIndex {
    collection: String,
    points: Vec<IndexedPoint>,
}

impl InMemoryVectorIndex {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            points: Vec::new(),
        }
    }

    /// Embed every entry and index it with its metadata as payload
    pub async fn build(
        collection: impl Into<String>,
        entries: &[StyleEntry],
        embedder: &dyn EmbeddingClient,
    ) -> Result<Self> {
        let mut index = Self::new(collection);
        let texts: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        for (entry, vector) in entries.iter().zip(vectors) {
            index.insert(entry, vector);
        }

        info!(
            collection = %index.collection,
            points = index.len(),
            embedder = embedder.name(),
            "built in-memory vector index"
        );
        Ok(index)
    }

    /// Add or replace the point for `entry`
    pub fn insert(&mut self, entry: &StyleEntry, vector: Vec<f32>) {
        let mut payload = HashMap::new();
        payload.insert("sid".to_string(), JsonValue::String(entry.id.clone()));
        payload.insert("text".to_string(), JsonValue::String(entry.text.clone()));
        for (key, value) in entry.metadata() {
            if let Some(value) = value {
                payload.insert(key, JsonValue::String(value));
            }
        }

        self.points.retain(|p| p.id != entry.id);
        self.points.push(IndexedPoint {
            id: entry.id.clone(),
            vector,
            payload,
        });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn payload_matches(payload: &HashMap<String, JsonValue>, filters: &[(&'static str, String)]) -> bool {
    filters.iter().all(|(key, value)| {
        matches!(payload.get(*key), Some(JsonValue::String(actual)) if actual == value)
    })
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<VectorHit>> {
        if query.collection != self.collection || query.vector.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<VectorHit> = self
            .points
            .iter()
            .filter(|point| payload_matches(&point.payload, &query.filters))
            .map(|point| VectorHit {
                id: point.id.clone(),
                score: cosine_similarity(&query.vector, &point.vector),
                vector: query.with_vectors.then(|| point.vector.clone()),
                payload: point.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(query.limit);

        Ok(hits)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
