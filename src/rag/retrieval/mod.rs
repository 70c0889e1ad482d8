// Retrieval orchestration over the style-guide corpus
pub mod engine;
pub mod types;

pub use engine::{RetrievalConfig, RetrievalEngine};
pub use types::{RetrievalMode, RetrievalRequest, RetrievalResult, RetrievedItem, Tier};
