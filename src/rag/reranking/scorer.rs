// Diversity-aware selection and style-affinity re-ranking
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::corpus::{QueryFilters, StyleEntry};
use crate::rag::scoring::{cosine_similarity, min_max_normalize, sort_desc, style_rule_score};

/// A candidate line before final ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub entry_id: String,
    pub raw_score: f32,
    /// Stored embedding, only present when the index returned vectors
    pub vector: Option<Vec<f32>>,
    pub payload: HashMap<String, JsonValue>,
}

impl ScoredCandidate {
    pub fn new(entry_id: impl Into<String>, raw_score: f32) -> Self {
        Self {
            entry_id: entry_id.into(),
            raw_score,
            vector: None,
            payload: HashMap::new(),
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }
}

/// Re-ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReRankConfig {
    /// Relevance weight in MMR; `1 - lambda` penalizes similarity to picks
    pub mmr_lambda: f32,
    /// Weight of normalized relevance against the style-rule score
    pub rerank_weight: f32,
}

impl Default for ReRankConfig {
    fn default() -> Self {
        Self {
            mmr_lambda: 0.5,
            rerank_weight: 0.65,
        }
    }
}

/// Entry with its re-ranked score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub entry: StyleEntry,
    pub relevance: f32,
    pub style_score: f32,
    pub reranked_score: f32,
}

/// Style-mode re-ranker: MMR spread first, then rule-based sharpening
pub struct ReRanker {
    config: ReRankConfig,
}

impl ReRanker {
    pub fn new() -> Self {
        Self {
            config: ReRankConfig::default(),
        }
    }

    pub fn with_config(config: ReRankConfig) -> Self {
        Self { config }
    }

    /// Maximal Marginal Relevance selection of up to `k` candidates.
    ///
    /// The most relevant candidate goes first; each later pick maximizes
    /// `lambda * relevance - (1 - lambda) * max_cosine_to_selected`.
    /// Ties keep input order.
    pub fn diversify(&self, candidates: Vec<ScoredCandidate>, k: usize) -> Vec<ScoredCandidate> {
        let lambda = self.config.mmr_lambda;
        let mut remaining = candidates;
        let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(k.min(remaining.len()));

        while !remaining.is_empty() && selected.len() < k {
            let best_idx = if selected.is_empty() {
                most_relevant(&remaining)
            } else {
                let mut best_idx = 0;
                let mut best_score = f32::NEG_INFINITY;
                for (idx, candidate) in remaining.iter().enumerate() {
                    let redundancy = max_similarity(candidate, &selected);
                    let mmr = lambda * candidate.raw_score - (1.0 - lambda) * redundancy;
                    if mmr > best_score {
                        best_score = mmr;
                        best_idx = idx;
                    }
                }
                best_idx
            };
            selected.push(remaining.remove(best_idx));
        }

        selected
    }

    /// Blend normalized relevance with the style-rule score and sort.
    ///
    /// Finalists whose entry is missing from `entries` are dropped.
    pub fn rerank(
        &self,
        finalists: &[ScoredCandidate],
        entries: &HashMap<String, StyleEntry>,
        filters: &QueryFilters,
    ) -> Vec<RankedEntry> {
        let raw: Vec<f32> = finalists.iter().map(|c| c.raw_score).collect();
        let normalized = min_max_normalize(&raw);
        let weight = self.config.rerank_weight;

        let mut ranked: Vec<RankedEntry> = finalists
            .iter()
            .zip(normalized)
            .filter_map(|(candidate, relevance)| {
                let entry = entries.get(&candidate.entry_id)?;
                let style_score = style_rule_score(entry, filters);
                Some(RankedEntry {
                    entry: entry.clone(),
                    relevance,
                    style_score,
                    reranked_score: weight * relevance + (1.0 - weight) * style_score,
                })
            })
            .collect();

        sort_desc(&mut ranked, |r| r.reranked_score);
        ranked
    }

    pub fn config(&self) -> &ReRankConfig {
        &self.config
    }
}

impl Default for ReRanker {
    fn default() -> Self {
        Self::new()
    }
}

fn most_relevant(candidates: &[ScoredCandidate]) -> usize {
    let mut best_idx = 0;
    for (idx, candidate) in candidates.iter().enumerate() {
        if candidate.raw_score > candidates[best_idx].raw_score {
            best_idx = idx;
        }
    }
    best_idx
}

fn max_similarity(candidate: &ScoredCandidate, selected: &[ScoredCandidate]) -> f32 {
    let Some(vector) = candidate.vector.as_deref() else {
        return 0.0;
    };
    selected
        .iter()
        .filter_map(|s| s.vector.as_deref())
        .map(|other| cosine_similarity(vector, other))
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_map(ids: &[&str]) -> HashMap<String, StyleEntry> {
        ids.iter()
            .map(|id| (id.to_string(), StyleEntry::new(*id, format!("line {}", id))))
            .collect()
    }

    #[test]
    fn test_reranker_creation() {
        let ranker = ReRanker::new();
        assert_eq!(ranker.config().mmr_lambda, 0.5);
        assert_eq!(ranker.config().rerank_weight, 0.65);
    }

    #[test]
    fn test_diversify_picks_most_relevant_first() {
        let ranker = ReRanker::new();
        let candidates = vec![
            ScoredCandidate::new("low", 0.2),
            ScoredCandidate::new("high", 0.9),
            ScoredCandidate::new("mid", 0.5),
        ];
        let picked = ranker.diversify(candidates, 3);
        let ids: Vec<&str> = picked.iter().map(|c| c.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_diversify_penalizes_near_duplicates() {
        let ranker = ReRanker::new();
        let candidates = vec![
            ScoredCandidate::new("a", 0.95).with_vector(vec![1.0, 0.0]),
            ScoredCandidate::new("a_dup", 0.94).with_vector(vec![1.0, 0.0]),
            ScoredCandidate::new("b", 0.80).with_vector(vec![0.0, 1.0]),
        ];
        let picked = ranker.diversify(candidates, 2);
        let ids: Vec<&str> = picked.iter().map(|c| c.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_diversify_without_vectors_is_truncation() {
        let ranker = ReRanker::new();
        let candidates: Vec<ScoredCandidate> = (0..6)
            .map(|i| ScoredCandidate::new(format!("e{}", i), 0.5))
            .collect();
        let picked = ranker.diversify(candidates, 4);
        let ids: Vec<&str> = picked.iter().map(|c| c.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["e0", "e1", "e2", "e3"]);
    }

    #[test]
    fn test_diversify_handles_small_pools() {
        let ranker = ReRanker::new();
        assert!(ranker.diversify(Vec::new(), 4).is_empty());
        assert_eq!(ranker.diversify(vec![ScoredCandidate::new("x", 0.1)], 4).len(), 1);
    }

    #[test]
    fn test_rerank_blends_style_score() {
        let ranker = ReRanker::new();
        let mut entries = entry_map(&["plain"]);
        entries.insert(
            "tagged".to_string(),
            StyleEntry::new("tagged", "Done.").with_style_tag("short"),
        );
        let filters = QueryFilters::from_pairs(vec![("style_tag", "short")]);

        // Flat relevance: both normalize to 1.0, style rule decides.
        let finalists = vec![ScoredCandidate::new("plain", 0.5), ScoredCandidate::new("tagged", 0.5)];
        let ranked = ranker.rerank(&finalists, &entries, &filters);

        assert_eq!(ranked[0].entry.id, "tagged");
        assert!((ranked[0].reranked_score - (0.65 + 0.35 * 0.5)).abs() < 1e-6);
        assert!((ranked[1].reranked_score - (0.65 + 0.35 * 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_rerank_drops_unknown_entries() {
        let ranker = ReRanker::new();
        let entries = entry_map(&["known"]);
        let finalists = vec![ScoredCandidate::new("ghost", 0.9), ScoredCandidate::new("known", 0.1)];
        let ranked = ranker.rerank(&finalists, &entries, &QueryFilters::none());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entry.id, "known");
        assert_eq!(ranked[0].relevance, 0.0);
    }
}
