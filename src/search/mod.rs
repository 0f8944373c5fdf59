//! Package search with exact, partial and fuzzy tiers
//!
//! Leaves first: `normalize` ← `fuzzy` (edit distance) ← `engine`.

pub mod engine;
pub mod fuzzy;
pub mod history;
pub mod normalize;
pub mod parser;
pub mod ranking;
pub mod record;


pub use engine::{SearchConfig, SearchEngine, SearchHit};
pub use normalize::normalize;
pub use record::PackageRecord;
