// Request and result types for style-guide retrieval
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::corpus::{QueryFilters, StyleEntry};

/// Scoring strategy for a retrieval call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Lexical + vector fusion over feature-matched lines
    Feature,
    /// Diversity-aware selection of stylistically representative lines
    Style,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Style => "style",
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrievalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feature" => Ok(Self::Feature),
            "style" => Ok(Self::Style),
            other => Err(format!("unknown retrieval mode '{}' (expected feature or style)", other)),
        }
    }
}

/// Filter-relaxation tier that produced the candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// All supplied filters
    Full,
    /// Device only
    DeviceOnly,
    /// No filters, capped pool
    Unfiltered,
}

impl Tier {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Full => 1,
            Self::DeviceOnly => 2,
            Self::Unfiltered => 3,
        }
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl PartialEq<u8> for Tier {
    fn eq(&self, other: &u8) -> bool {
        self.as_u8() == *other
    }
}

/// A retrieval call as received from a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: QueryFilters,
    #[serde(default = "default_top_k", alias = "topK")]
    pub top_k: i64,
    #[serde(default)]
    pub mode: Option<RetrievalMode>,
}

fn default_top_k() -> i64 {
    5
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: QueryFilters::default(),
            top_k: default_top_k(),
            mode: None,
        }
    }

    pub fn with_filters(mut self, filters: QueryFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_mode(mut self, mode: RetrievalMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// `top_k` clamped into `[1, max_top_k]`
    pub fn effective_top_k(&self, max_top_k: usize) -> usize {
        let max = max_top_k.max(1) as i64;
        self.top_k.clamp(1, max) as usize
    }
}

/// One ranked style-guide line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedItem {
    pub sid: String,
    pub text: String,
    pub score: f32,
    pub metadata: BTreeMap<String, Option<String>>,
}

impl RetrievedItem {
    pub fn from_entry(entry: &StyleEntry, score: f32) -> Self {
        Self {
            sid: entry.id.clone(),
            text: entry.text.clone(),
            score,
            metadata: entry.metadata(),
        }
    }
}

/// Ranked lines plus diagnostics describing how they were produced
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub items: Vec<RetrievedItem>,
    pub latency_ms: u64,
    pub mode: RetrievalMode,
    pub feature_confidence: f32,
    pub novelty_mode: bool,
    pub candidate_count: usize,
    pub tier: Tier,
}
