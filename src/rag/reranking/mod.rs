// Re-ranking: MMR diversity selection and style-affinity scoring
pub mod scorer;

pub use scorer::{RankedEntry, ReRankConfig, ReRanker, ScoredCandidate};
