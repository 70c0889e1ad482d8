// Vector index interface
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::errors::Result;

/// A filtered nearest-neighbor request
#[derive(Debug, Clone)]
pub struct VectorQuery {
    pub collection: String,
    pub vector: Vec<f32>,
    pub limit: usize,
    /// Exact-match payload constraints, all must hold
    pub filters: Vec<(&'static str, String)>,
    /// Return stored vectors alongside hits
    pub with_vectors: bool,
}

/// One search hit; `id` is the corpus entry id carried in the payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub vector: Option<Vec<f32>>,
    pub payload: HashMap<String, JsonValue>,
}

/// Nearest-neighbor search backend.
///
/// Implementations are shared across concurrent requests. Callers treat
/// any error as "no vector signal".
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Hits ordered by descending similarity, at most `query.limit`
    async fn search(&self, query: &VectorQuery) -> Result<Vec<VectorHit>>;

    /// Backend name for diagnostics
    fn name(&self) -> &str;
}

/// Resolve the corpus entry id from a hit payload (`sid`, then `id`)
pub fn payload_entry_id(payload: &HashMap<String, JsonValue>) -> Option<String> {
    ["sid", "id"].iter().find_map(|key| match payload.get(*key) {
        Some(JsonValue::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
