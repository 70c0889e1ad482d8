// Retrieval engine: tiered candidate lookup, mode selection, score fusion
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::corpus::{CorpusReader, QueryFilters, StyleEntry};
use crate::embedding::EmbeddingClient;
use crate::errors::{Result, RetrievalError};
use crate::rag::reranking::{ReRankConfig, ReRanker, ScoredCandidate};
use crate::rag::retrieval::types::{
    RetrievalMode, RetrievalRequest, RetrievalResult, RetrievedItem, Tier,
};
use crate::rag::scoring::{keyword_score, min_max_normalize, query_tokens, sort_desc};
use crate::vector_db::{VectorHit, VectorIndex, VectorQuery};

/// Confidence when the requested feature exists in the corpus
pub const KNOWN_FEATURE_CONFIDENCE: f32 = 0.8;
/// Confidence when the requested feature is absent from the corpus
pub const UNKNOWN_FEATURE_CONFIDENCE: f32 = 0.2;

/// Tunable retrieval parameters.
///
/// The weights are empirical and have not been calibrated against a real
/// corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Lexical weight in feature-mode fusion; vector gets `1 - alpha`
    pub fusion_alpha: f32,
    /// Relevance weight in MMR selection
    pub mmr_lambda: f32,
    /// Relevance weight against the style-rule score in style mode
    pub style_rerank_weight: f32,
    /// Minimum feature confidence for automatic feature mode
    pub feature_confidence_threshold: f32,
    /// Upper bound on entries read per corpus lookup
    pub candidate_cap: usize,
    /// Upper bound on requested results
    pub max_top_k: usize,
    /// Relevance given to every line when style mode has no vector hits
    pub style_flat_relevance: f32,
    /// Vector collection holding style-guide lines
    pub collection: String,
    /// Deadline for a vector search call
    pub vector_timeout_ms: u64,
    /// Deadline for a query embedding call
    pub embed_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fusion_alpha: 0.3,
            mmr_lambda: 0.5,
            style_rerank_weight: 0.65,
            feature_confidence_threshold: 0.6,
            candidate_cap: 200,
            max_top_k: 20,
            style_flat_relevance: 0.5,
            collection: "style_guides".to_string(),
            vector_timeout_ms: 2000,
            embed_timeout_ms: 2000,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("fusion_alpha", self.fusion_alpha),
            ("mmr_lambda", self.mmr_lambda),
            ("style_rerank_weight", self.style_rerank_weight),
            ("feature_confidence_threshold", self.feature_confidence_threshold),
        ];
        for (name, value) in weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(RetrievalError::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.candidate_cap == 0 {
            return Err(RetrievalError::ConfigError("candidate_cap must be at least 1".to_string()));
        }
        if self.max_top_k == 0 {
            return Err(RetrievalError::ConfigError("max_top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    fn rerank_config(&self) -> ReRankConfig {
        ReRankConfig {
            mmr_lambda: self.mmr_lambda,
            rerank_weight: self.style_rerank_weight,
        }
    }
}

/// Hybrid retrieval over the style-guide corpus.
///
/// Holds no mutable state; one engine serves concurrent requests.
pub struct RetrievalEngine {
    corpus: Arc<dyn CorpusReader>,
    embedder: Option<Arc<dyn EmbeddingClient>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    reranker: ReRanker,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Lexical-only engine with default parameters
    pub fn new(corpus: Arc<dyn CorpusReader>) -> Self {
        Self::with_config(corpus, RetrievalConfig::default())
    }

    pub fn with_config(corpus: Arc<dyn CorpusReader>, config: RetrievalConfig) -> Self {
        Self {
            corpus,
            embedder: None,
            vector_index: None,
            reranker: ReRanker::with_config(config.rerank_config()),
            config,
        }
    }

    /// Enable the vector signal
    pub fn with_vector_signal(
        mut self,
        embedder: Arc<dyn EmbeddingClient>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        self.embedder = Some(embedder);
        self.vector_index = Some(vector_index);
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    fn vector_available(&self) -> bool {
        self.embedder.is_some() && self.vector_index.is_some()
    }

    /// Coarse signal for mode selection: 0.0 without a feature, else
    /// 0.8 when the corpus knows it and 0.2 when it does not
    pub fn feature_confidence(&self, feature_norm: Option<&str>) -> Result<f32> {
        match feature_norm.filter(|f| !f.is_empty()) {
            None => Ok(0.0),
            Some(feature) => Ok(if self.corpus.has_feature(feature)? {
                KNOWN_FEATURE_CONFIDENCE
            } else {
                UNKNOWN_FEATURE_CONFIDENCE
            }),
        }
    }

    /// Honor an explicit mode, otherwise pick by confidence
    pub fn select_mode(&self, requested: Option<RetrievalMode>, confidence: f32) -> RetrievalMode {
        requested.unwrap_or(if confidence >= self.config.feature_confidence_threshold {
            RetrievalMode::Feature
        } else {
            RetrievalMode::Style
        })
    }

    /// Candidate pool with filter relaxation; stops at the first non-empty tier
    pub fn tiered_candidates(&self, filters: &QueryFilters) -> Result<(Vec<StyleEntry>, Tier)> {
        let cap = self.config.candidate_cap;

        let entries = self.corpus.query(filters, cap)?;
        if !entries.is_empty() {
            return Ok((entries, Tier::Full));
        }

        if filters.feature_norm().is_some() {
            let entries = self.corpus.query(&filters.device_only(), cap)?;
            if !entries.is_empty() {
                debug!(device = ?filters.device(), "relaxed to device-only filters");
                return Ok((entries, Tier::DeviceOnly));
            }
        }

        debug!("relaxed to unfiltered candidate pool");
        let entries = self.corpus.query(&QueryFilters::none(), cap)?;
        Ok((entries, Tier::Unfiltered))
    }

    /// Rank style-guide lines for a request.
    ///
    /// Vector and embedding failures degrade the ranking and are never
    /// returned; only corpus read errors propagate.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievalResult> {
        let start = Instant::now();
        let top_k = request.effective_top_k(self.config.max_top_k);
        let filters = &request.filters;

        let feature_confidence = self.feature_confidence(filters.feature_norm())?;
        let mut mode = self.select_mode(request.mode, feature_confidence);

        let (entries, tier) = self.tiered_candidates(filters)?;

        // An explicit feature request keeps a relaxed pool; a confidence-selected
        // one needs full-filter candidates.
        let downgrade = match request.mode {
            Some(_) => entries.is_empty(),
            None => tier != Tier::Full,
        };
        if mode == RetrievalMode::Feature && downgrade {
            debug!(tier = tier.as_u8(), "no feature candidates, switching to style mode");
            mode = RetrievalMode::Style;
        }

        let items = match mode {
            RetrievalMode::Feature => self.score_feature(&request.query, filters, entries, top_k).await,
            RetrievalMode::Style => self.score_style(&request.query, filters, entries, top_k).await?,
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        info!(
            mode = %mode,
            tier = tier.as_u8(),
            feature_confidence,
            items = items.len(),
            latency_ms,
            "retrieval complete"
        );

        Ok(RetrievalResult {
            candidate_count: items.len(),
            items,
            latency_ms,
            mode,
            feature_confidence,
            novelty_mode: mode != RetrievalMode::Feature,
            tier,
        })
    }

    /// Lexical + vector fusion over the tier-selected pool
    async fn score_feature(
        &self,
        query: &str,
        filters: &QueryFilters,
        entries: Vec<StyleEntry>,
        top_k: usize,
    ) -> Vec<RetrievedItem> {
        let tokens = query_tokens(query);
        let lexical: Vec<f32> = entries.iter().map(|e| keyword_score(&e.text, &tokens)).collect();
        let lexical_norm = min_max_normalize(&lexical);

        let mut vector_norm: HashMap<String, f32> = HashMap::new();
        if !query.trim().is_empty() && self.vector_available() {
            if let Some(vector) = self.embed_query(query).await {
                let limit = (top_k * 4).max(20);
                let hits = self.vector_search(vector, limit, filters.lookup_pairs(), false).await;
                let best = best_score_per_id(hits);
                let raw: Vec<f32> = best.iter().map(|(_, score)| *score).collect();
                vector_norm = best
                    .into_iter()
                    .map(|(id, _)| id)
                    .zip(min_max_normalize(&raw))
                    .collect();
            }
        }

        let alpha = self.config.fusion_alpha;
        let mut scored: Vec<(StyleEntry, f32)> = entries
            .into_iter()
            .zip(lexical_norm)
            .map(|(entry, lexical)| {
                let score = if vector_norm.is_empty() {
                    lexical
                } else {
                    let vector = vector_norm.get(&entry.id).copied().unwrap_or(0.0);
                    alpha * lexical + (1.0 - alpha) * vector
                };
                (entry, score)
            })
            .collect();

        sort_desc(&mut scored, |(_, score)| *score);
        scored.truncate(top_k);

        scored
            .iter()
            .map(|(entry, score)| RetrievedItem::from_entry(entry, *score))
            .collect()
    }

    /// MMR-diversified candidates re-ranked by style affinity
    async fn score_style(
        &self,
        query: &str,
        filters: &QueryFilters,
        entries: Vec<StyleEntry>,
        top_k: usize,
    ) -> Result<Vec<RetrievedItem>> {
        let query_text = style_query_text(query, filters);

        let mut candidates: Vec<ScoredCandidate> = Vec::new();
        if !query_text.is_empty() && self.vector_available() {
            if let Some(vector) = self.embed_query(&query_text).await {
                let limit = (top_k * 5).max(40);
                let device_only = filters.device_only().lookup_pairs();
                candidates = self
                    .vector_search(vector, limit, device_only, true)
                    .await
                    .into_iter()
                    .map(|hit| ScoredCandidate {
                        entry_id: hit.id,
                        raw_score: hit.score,
                        vector: hit.vector,
                        payload: hit.payload,
                    })
                    .collect();
            }
        }

        let mut lookup: HashMap<String, StyleEntry> = HashMap::with_capacity(entries.len());
        if candidates.is_empty() {
            let pool = if entries.is_empty() {
                self.corpus.query(&QueryFilters::none(), self.config.candidate_cap)?
            } else {
                entries
            };
            for entry in pool {
                candidates.push(ScoredCandidate::new(entry.id.clone(), self.config.style_flat_relevance));
                lookup.insert(entry.id.clone(), entry);
            }
        } else {
            for entry in entries {
                lookup.insert(entry.id.clone(), entry);
            }
            let mut seen = HashSet::new();
            let missing: Vec<String> = candidates
                .iter()
                .filter(|c| !lookup.contains_key(&c.entry_id) && seen.insert(c.entry_id.clone()))
                .map(|c| c.entry_id.clone())
                .collect();
            if !missing.is_empty() {
                for entry in self.corpus.get_many(&missing)? {
                    lookup.insert(entry.id.clone(), entry);
                }
            }
        }

        let finalists = self.reranker.diversify(candidates, top_k * 2);
        let mut ranked = self.reranker.rerank(&finalists, &lookup, filters);
        ranked.truncate(top_k);

        Ok(ranked
            .iter()
            .map(|r| RetrievedItem::from_entry(&r.entry, r.reranked_score))
            .collect())
    }

    /// Embed the query under a deadline; `None` means no vector signal
    async fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        let deadline = Duration::from_millis(self.config.embed_timeout_ms);

        match tokio::time::timeout(deadline, embedder.embed(&[text.to_string()])).await {
            Ok(Ok(vectors)) => vectors.into_iter().next().filter(|v| !v.is_empty()),
            Ok(Err(e)) => {
                warn!(embedder = embedder.name(), error = %e, "query embedding failed, continuing without vectors");
                None
            }
            Err(_) => {
                warn!(
                    embedder = embedder.name(),
                    timeout_ms = self.config.embed_timeout_ms,
                    "query embedding timed out, continuing without vectors"
                );
                None
            }
        }
    }

    /// Search under a deadline; any failure yields no hits
    async fn vector_search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filters: Vec<(&'static str, String)>,
        with_vectors: bool,
    ) -> Vec<VectorHit> {
        let Some(index) = self.vector_index.as_ref() else {
            return Vec::new();
        };
        let query = VectorQuery {
            collection: self.config.collection.clone(),
            vector,
            limit,
            filters,
            with_vectors,
        };
        let deadline = Duration::from_millis(self.config.vector_timeout_ms);

        match tokio::time::timeout(deadline, index.search(&query)).await {
            Ok(Ok(hits)) => {
                debug!(index = index.name(), hits = hits.len(), "vector search complete");
                hits
            }
            Ok(Err(e)) => {
                warn!(index = index.name(), error = %e, "vector search failed, continuing without vectors");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    index = index.name(),
                    timeout_ms = self.config.vector_timeout_ms,
                    "vector search timed out, continuing without vectors"
                );
                Vec::new()
            }
        }
    }
}

/// First hit per entry id, in hit order; the index returns hits best first
fn best_score_per_id(hits: Vec<VectorHit>) -> Vec<(String, f32)> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(hit.id.clone()))
        .map(|hit| (hit.id, hit.score))
        .collect()
}

/// Caller text, or the style constraints when the text is blank
fn style_query_text(query: &str, filters: &QueryFilters) -> String {
    let trimmed = query.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    [filters.style_tag(), filters.tone(), filters.device()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}
