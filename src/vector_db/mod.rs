//! Nearest-neighbor search over embedded corpus entries.

pub mod index;
pub mod manager;
pub mod memory;

pub use index::{VectorHit, VectorIndex, VectorQuery};
pub use manager::QdrantIndex;
pub use memory::InMemoryVectorIndex;
