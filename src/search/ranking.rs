//! Result ordering
//!
//! Results only ever come from one tier. Exact and partial matches keep the
//! caller's record order; fuzzy matches are ordered by similarity, with the
//! original position breaking ties.

use serde::Serialize;
use std::cmp::Ordering;

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Whole normalized query is a substring of a field
    Exact,
    /// Every query term is a substring of some field
    Partial,
    /// Edit-distance similarity above the threshold
    Fuzzy,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Partial => "partial",
            MatchTier::Fuzzy => "fuzzy",
        }
    }
}

/// Position and strength of one matched record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub tier: MatchTier,
    /// Index of the record in the caller's collection
    pub index: usize,
    /// 1.0 for exact and partial matches, best field similarity for fuzzy ones
    pub similarity: f64,
}

impl MatchScore {
    pub fn substring(tier: MatchTier, index: usize) -> Self {
        Self {
            tier,
            index,
            similarity: 1.0,
        }
    }

    pub fn fuzzy(index: usize, similarity: f64) -> Self {
        Self {
            tier: MatchTier::Fuzzy,
            index,
            similarity,
        }
    }

    /// Higher similarity first, then lower index
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .similarity
            .partial_cmp(&self.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Put scores in their final order
pub fn sort_scores(scores: &mut [MatchScore]) {
    scores.sort_by(MatchScore::rank_cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_scores_keep_input_order() {
        let mut scores = vec![
            MatchScore::substring(MatchTier::Exact, 0),
            MatchScore::substring(MatchTier::Exact, 3),
            MatchScore::substring(MatchTier::Exact, 5),
        ];
        sort_scores(&mut scores);
        let order: Vec<usize> = scores.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 3, 5]);
    }

    #[test]
    fn test_fuzzy_scores_by_similarity_then_index() {
        let mut scores = vec![
            MatchScore::fuzzy(0, 0.7),
            MatchScore::fuzzy(1, 0.9),
            MatchScore::fuzzy(2, 0.7),
            MatchScore::fuzzy(3, 0.8),
        ];
        sort_scores(&mut scores);
        let order: Vec<usize> = scores.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_tier_names() {
        assert_eq!(MatchTier::Exact.as_str(), "exact");
        assert_eq!(MatchTier::Partial.as_str(), "partial");
        assert_eq!(MatchTier::Fuzzy.as_str(), "fuzzy");
    }
}
