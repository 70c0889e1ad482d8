//! Text embedding backends.
//!
//! - Pseudo: deterministic SHA-256 derived vectors, no model required
//! - Engine: BERT-family model run locally through Candle

pub mod client;
pub mod engine;
pub mod pseudo;

pub use client::{create_client, EmbeddingClient};
pub use engine::EmbeddingEngine;
pub use pseudo::PseudoEmbedding;
