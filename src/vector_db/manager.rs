// Qdrant-backed vector index
use anyhow::Context;
use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vector_output, vectors_output::VectorsOptions,
    Condition, Filter, PointId, ScoredPoint, SearchPointsBuilder, Value as QdrantValue,
    VectorsOutput,
};
use qdrant_client::Qdrant;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::VectorStoreConfig;
use crate::errors::{Result, RetrievalError};
use crate::vector_db::index::{payload_entry_id, VectorHit, VectorIndex, VectorQuery};

/// Vector index served by a Qdrant instance
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
}

impl QdrantIndex {
    /// Build a client for the configured Qdrant endpoint.
    ///
    /// No request is sent here; an unreachable server shows up as search
    /// errors later.
    pub fn connect(config: &VectorStoreConfig) -> Result<Self> {
        let url = config.url();
        let client = Qdrant::from_url(&url)
            .api_key(config.api_key.clone())
            .timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .context("Failed to create Qdrant client")?;

        info!(url = %url, "qdrant client configured");
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(&self, query: &VectorQuery) -> Result<Vec<VectorHit>> {
        if query.vector.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = SearchPointsBuilder::new(
            query.collection.as_str(),
            query.vector.clone(),
            query.limit as u64,
        )
        .with_payload(true)
        .with_vectors(query.with_vectors);

        if !query.filters.is_empty() {
            let conditions: Vec<Condition> = query
                .filters
                .iter()
                .map(|(key, value)| Condition::matches(*key, value.clone()))
                .collect();
            request = request.filter(Filter::must(conditions));
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| RetrievalError::VectorIndexError(format!("Failed to search points: {}", e)))?;

        let hits: Vec<VectorHit> = response
            .result
            .into_iter()
            .filter_map(|point| scored_point_to_hit(point, query.with_vectors))
            .collect();

        debug!(collection = %query.collection, hits = hits.len(), "qdrant search complete");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

fn scored_point_to_hit(point: ScoredPoint, with_vectors: bool) -> Option<VectorHit> {
    let payload: HashMap<String, JsonValue> = point
        .payload
        .iter()
        .filter_map(|(key, value)| qdrant_to_json_value(value).map(|v| (key.clone(), v)))
        .collect();

    let Some(id) = payload_entry_id(&payload) else {
        debug!(point = %point_id_to_string(&point.id), "skipping hit without entry id");
        return None;
    };

    let vector = if with_vectors {
        point.vectors.and_then(dense_vector)
    } else {
        None
    };

    Some(VectorHit {
        id,
        score: point.score,
        vector,
        payload,
    })
}

/// Unnamed dense vector of a hit; named, sparse and multi vectors are ignored
fn dense_vector(vectors: VectorsOutput) -> Option<Vec<f32>> {
    match vectors.vectors_options? {
        VectorsOptions::Vector(output) => match output.into_vector() {
            vector_output::Vector::Dense(dense) => Some(dense.data),
            _ => None,
        },
        VectorsOptions::Vectors(_) => None,
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        Kind::NullValue(_) => Some(JsonValue::Null),
        _ => None,
    })
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    point_id
        .as_ref()
        .and_then(|id| match &id.point_id_options {
            Some(PointIdOptions::Num(n)) => Some(n.to_string()),
            Some(PointIdOptions::Uuid(u)) => Some(u.clone()),
            None => None,
        })
        .unwrap_or_else(|| "unknown".to_string())
}
