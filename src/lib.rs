//! stylerag - Hybrid retrieval of UX style-guide lines
//!
//! Ranks reference lines for a drafting step by combining lexical overlap,
//! vector similarity and metadata affinity over a style-guide corpus.
//!
//! # Architecture
//!
//! - **corpus**: style-guide lines and filtered lookup
//! - **embedding** / **vector_db**: the optional vector signal
//! - **rag**: scoring, MMR re-ranking, the retrieval engine, prompt block
//! - **config** / **telemetry** / **cli**: ambient plumbing for the binary

pub mod errors;
pub use errors::{Result, RetrievalError};

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod vector_db;

pub mod rag;
pub use rag::{RetrievalEngine, RetrievalMode, RetrievalRequest, RetrievalResult};

pub mod cli;
pub mod telemetry;
