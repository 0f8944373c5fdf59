//! Query Parser
//!
//! Splits a raw query into the forms the search tiers and the history need.

use super::normalize::normalize;

/// Parsed and processed search query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Lowercase-only fold of the raw query, used as the history key
    pub history_key: String,
    /// Fully normalized query, used for matching
    pub normalized: String,
    /// Whitespace tokens of the normalized query
    pub terms: Vec<String>,
}

impl ParsedQuery {
    /// Nothing left to match after normalization
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Query parser and preprocessor
pub struct QueryParser;

impl QueryParser {
    /// Parse a search query into its components
    pub fn parse(query: &str) -> ParsedQuery {
        let normalized = normalize(query);
        let terms = normalized.split_whitespace().map(str::to_string).collect();

        ParsedQuery {
            // Only case-folded: "Lima " and "lima" are different history entries
            history_key: query.to_lowercase(),
            normalized,
            terms,
        }
    }
}
