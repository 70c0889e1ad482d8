//! Style-guide corpus: entry types and read access.
//!
//! The corpus is populated by the ingestion pipeline and is read-only at
//! retrieval time. Readers expose a point-in-time snapshot.

pub mod store;
pub mod types;

pub use store::{CorpusReader, InMemoryCorpus};
pub use types::{QueryFilters, StyleEntry};
