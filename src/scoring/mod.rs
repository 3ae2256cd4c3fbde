pub mod matcher;
pub mod similarity;

pub use matcher::{best_match, BestMatch, NO_MATCH_KEY};
pub use similarity::{ratio, MatchingBlock, SequenceMatcher};
