//! Scoring primitives shared by both retrieval modes.

use std::collections::HashSet;

use crate::corpus::{QueryFilters, StyleEntry};

/// Style-affinity base score before any metadata matches
pub const STYLE_RULE_BASE: f32 = 0.2;
pub const STYLE_RULE_STYLE_TAG: f32 = 0.3;
pub const STYLE_RULE_DEVICE: f32 = 0.2;
pub const STYLE_RULE_TONE: f32 = 0.1;
pub const STYLE_RULE_FEATURE: f32 = 0.1;

/// Cosine similarity; 0 for empty, mismatched or zero-norm vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Min-max normalize into `[0, 1]`; an all-equal set maps to all `1.0`
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }

    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let range = max - min;

    if range.abs() <= f32::EPSILON * max.abs().max(1.0) {
        return vec![1.0; scores.len()];
    }

    scores.iter().map(|s| (s - min) / range).collect()
}

/// Distinct lowercase whitespace tokens of `query`, in first-seen order
pub fn query_tokens(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|tok| seen.insert(tok.to_string()))
        .map(str::to_string)
        .collect()
}

/// Number of distinct query tokens occurring as substrings of `text`
pub fn keyword_score(text: &str, tokens: &[String]) -> f32 {
    if text.is_empty() || tokens.is_empty() {
        return 0.0;
    }
    let target = text.to_lowercase();
    tokens.iter().filter(|tok| target.contains(tok.as_str())).count() as f32
}

/// Rule-based affinity between an entry and the caller's style constraints
pub fn style_rule_score(entry: &StyleEntry, filters: &QueryFilters) -> f32 {
    let mut score = STYLE_RULE_BASE;
    if is_match(filters.style_tag(), entry.style_tag.as_deref()) {
        score += STYLE_RULE_STYLE_TAG;
    }
    if is_match(filters.device(), entry.device.as_deref()) {
        score += STYLE_RULE_DEVICE;
    }
    if is_match(filters.tone(), entry.tone.as_deref()) {
        score += STYLE_RULE_TONE;
    }
    if is_match(filters.feature_norm(), entry.feature_norm.as_deref()) {
        score += STYLE_RULE_FEATURE;
    }
    score
}

fn is_match(wanted: Option<&str>, actual: Option<&str>) -> bool {
    matches!((wanted, actual), (Some(w), Some(a)) if !a.is_empty() && w == a)
}

/// Stable descending sort by score; NaN compares equal
pub fn sort_desc<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| {
        score(b)
            .partial_cmp(&score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
