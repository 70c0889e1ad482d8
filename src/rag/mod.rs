// Hybrid retrieval of UX style-guide lines
//
// Components:
// - Scoring: lexical, cosine, normalization and style-rule primitives
// - Re-ranking: MMR diversity selection and style-affinity blending
// - Retrieval Engine: tiered lookup, mode selection, score fusion
// - Context: prompt block of reference examples for the drafting step

pub mod context;
pub mod reranking;
pub mod retrieval;
pub mod scoring;

// Re-export key types
pub use context::{ExampleBlock, ExampleBlockBuilder, ExampleFormat};
pub use reranking::ReRanker;
pub use retrieval::{RetrievalEngine, RetrievalMode, RetrievalRequest, RetrievalResult};
