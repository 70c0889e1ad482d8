// Corpus store: read-only access to style-guide entries
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::corpus::types::{QueryFilters, StyleEntry};
use crate::errors::{Result, RetrievalError};

/// Read access to the style-guide corpus.
///
/// Implementations must be safe to share across concurrent requests and
/// must serve a consistent snapshot for the duration of a call.
pub trait CorpusReader: Send + Sync {
    /// Entries matching every supplied filter, in corpus order, at most `limit`
    fn query(&self, filters: &QueryFilters, limit: usize) -> Result<Vec<StyleEntry>>;

    /// Whether any entry carries exactly this `feature_norm`
    fn has_feature(&self, feature_norm: &str) -> Result<bool>;

    /// Fetch entries by id; unknown ids are skipped
    fn get_many(&self, ids: &[String]) -> Result<Vec<StyleEntry>>;

    /// Total number of entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable in-memory corpus snapshot.
///
/// Cloning is cheap; clones share the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    entries: Arc<Vec<StyleEntry>>,
    by_id: Arc<HashMap<String, usize>>,
}

impl InMemoryCorpus {
    /// Create a snapshot from entries (later duplicates of an id are dropped)
    pub fn new(entries: Vec<StyleEntry>) -> Self {
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if by_id.contains_key(&entry.id) {
                debug!(id = %entry.id, "skipping duplicate corpus entry");
                continue;
            }
            by_id.insert(entry.id.clone(), kept.len());
            kept.push(entry);
        }

        Self {
            entries: Arc::new(kept),
            by_id: Arc::new(by_id),
        }
    }

    /// Load a snapshot from a JSON-lines file, one `StyleEntry` per line
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: StyleEntry = serde_json::from_str(&line).map_err(|e| {
                RetrievalError::CorpusError(format!(
                    "{}:{}: invalid entry: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        let corpus = Self::new(entries);
        info!(path = %path.display(), entries = corpus.len(), "loaded corpus snapshot");
        Ok(corpus)
    }

    /// All entries in corpus order
    pub fn entries(&self) -> &[StyleEntry] {
        &self.entries
    }
}

impl CorpusReader for InMemoryCorpus {
    fn query(&self, filters: &QueryFilters, limit: usize) -> Result<Vec<StyleEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.matches(filters))
            .take(limit)
            .cloned()
            .collect())
    }

    fn has_feature(&self, feature_norm: &str) -> Result<bool> {
        Ok(self
            .entries
            .iter()
            .any(|entry| entry.feature_norm.as_deref() == Some(feature_norm)))
    }

    fn get_many(&self, ids: &[String]) -> Result<Vec<StyleEntry>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .map(|&idx| self.entries[idx].clone())
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
