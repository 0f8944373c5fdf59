//! Search Engine
//!
//! Resolves a free-text query against caller-supplied records with three
//! escalating tiers, stopping at the first tier that finds anything:
//!
//! 1. exact: the normalized query is a substring of a normalized field
//! 2. partial: every query term is a substring of some field
//! 3. fuzzy: the whole query is similar enough to some field
//!
//! Every query is also counted in a bounded history that drives
//! [`SearchEngine::suggest`].

use super::fuzzy::{FuzzyMatcher, DEFAULT_FUZZY_THRESHOLD};
use super::history::{HistoryEntry, SearchHistory, DEFAULT_HISTORY_CAPACITY};
use super::normalize::normalize;
use super::parser::{ParsedQuery, QueryParser};
use super::ranking::{sort_scores, MatchScore, MatchTier};
use super::record::Searchable;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Search tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Similarity a field must exceed in the fuzzy tier
    pub fuzzy_threshold: f64,
    /// Distinct queries remembered before the least recent is evicted
    pub history_capacity: usize,
    /// Maximum number of suggestions returned
    pub suggestion_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..1.0).contains(&self.fuzzy_threshold) {
            return Err(AppError::Config(format!(
                "fuzzy_threshold must be in [0, 1), got {}",
                self.fuzzy_threshold
            )));
        }
        if self.history_capacity == 0 {
            return Err(AppError::Config("history_capacity must be at least 1".to_string()));
        }
        if self.suggestion_limit == 0 {
            return Err(AppError::Config("suggestion_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// A matched record with the score that placed it
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a, R> {
    pub record: &'a R,
    pub score: MatchScore,
}

/// Tiered search with query history
#[derive(Debug, Clone)]
pub struct SearchEngine {
    fuzzy_matcher: FuzzyMatcher,
    history: SearchHistory,
    suggestion_limit: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    /// Create a new search engine with default configuration
    pub fn new() -> Self {
        Self {
            fuzzy_matcher: FuzzyMatcher::default(),
            history: SearchHistory::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    /// Create a search engine from validated configuration
    pub fn with_config(config: &SearchConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self {
            fuzzy_matcher: FuzzyMatcher::new(config.fuzzy_threshold),
            history: SearchHistory::new(config.history_capacity),
            suggestion_limit: config.suggestion_limit,
        })
    }

    #[cfg(test)]
    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    /// Search records with a query string
    ///
    /// A query with nothing left after normalization, blank ones included,
    /// or an empty collection yields no hits. Every call is still counted in
    /// the history.
    pub fn search<'a, R: Searchable>(&mut self, query: &str, records: &'a [R]) -> Vec<SearchHit<'a, R>> {
        let parsed = QueryParser::parse(query);
        let hits = if parsed.is_empty() || records.is_empty() {
            Vec::new()
        } else {
            self.run_tiers(&parsed, records)
        };

        self.history.record(&parsed.history_key, hits.len());
        hits
    }

    /// Up to the configured limit of past queries starting with `prefix`
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        self.suggest_entries(prefix)
            .into_iter()
            .map(|e| e.query.clone())
            .collect()
    }

    /// Same as [`suggest`](Self::suggest) but with frequencies and timestamps
    pub fn suggest_entries(&self, prefix: &str) -> Vec<&HistoryEntry> {
        self.history.suggest(prefix, self.suggestion_limit)
    }

    fn run_tiers<'a, R: Searchable>(&self, parsed: &ParsedQuery, records: &'a [R]) -> Vec<SearchHit<'a, R>> {
        let fields: Vec<Vec<String>> = records
            .iter()
            .map(|r| r.searchable_fields().into_iter().map(normalize).collect())
            .collect();

        let mut scores = Self::exact_tier(&parsed.normalized, &fields);
        if scores.is_empty() {
            scores = Self::partial_tier(&parsed.terms, &fields);
        }
        if scores.is_empty() {
            scores = self.fuzzy_tier(&parsed.normalized, &fields);
        }

        sort_scores(&mut scores);

        debug!(
            "Search '{}' matched {} of {} records ({})",
            parsed.normalized,
            scores.len(),
            records.len(),
            scores.first().map_or("none", |s| s.tier.as_str())
        );

        scores
            .into_iter()
            .map(|score| SearchHit {
                record: &records[score.index],
                score,
            })
            .collect()
    }

    fn exact_tier(query: &str, fields: &[Vec<String>]) -> Vec<MatchScore> {
        fields
            .iter()
            .enumerate()
            .filter(|(_, record_fields)| record_fields.iter().any(|f| f.contains(query)))
            .map(|(index, _)| MatchScore::substring(MatchTier::Exact, index))
            .collect()
    }

    fn partial_tier(terms: &[String], fields: &[Vec<String>]) -> Vec<MatchScore> {
        if terms.is_empty() {
            return Vec::new();
        }
        fields
            .iter()
            .enumerate()
            .filter(|(_, record_fields)| {
                terms
                    .iter()
                    .all(|term| record_fields.iter().any(|f| f.contains(term.as_str())))
            })
            .map(|(index, _)| MatchScore::substring(MatchTier::Partial, index))
            .collect()
    }

    fn fuzzy_tier(&self, query: &str, fields: &[Vec<String>]) -> Vec<MatchScore> {
        fields
            .iter()
            .enumerate()
            .filter_map(|(index, record_fields)| {
                self.fuzzy_matcher
                    .best_match(query, record_fields.iter().map(String::as_str))
                    .map(|similarity| MatchScore::fuzzy(index, similarity))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::record::PackageRecord;

    fn package(code: &str, recipient: &str, city: &str, address: &str, status: &str) -> PackageRecord {
        PackageRecord {
            code: Some(code.to_string()),
            recipient: Some(recipient.to_string()),
            city: Some(city.to_string()),
            address: Some(address.to_string()),
            status: Some(status.to_string()),
            ..PackageRecord::default()
        }
    }

    fn fixtures() -> Vec<PackageRecord> {
        vec![
            package("2025ABC1", "Juan Pérez", "Lima", "Av. Arequipa 123", "en_transito"),
            package("2025XYZ9", "María Quispe", "Cusco", "Calle Plateros 45", "entregado"),
            package("2025QRS4", "Rosa Huamán", "Piura", "Jr. Tacna 800", "pendiente"),
        ]
    }

    fn codes<R>(hits: &[SearchHit<'_, R>]) -> Vec<usize> {
        hits.iter().map(|h| h.score.index).collect()
    }

    #[test]
    fn test_exact_tier() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        let hits = engine.search("lima", &records);
        assert_eq!(codes(&hits), vec![0]);
        assert_eq!(hits[0].score.tier, MatchTier::Exact);
        assert_eq!(hits[0].record.city.as_deref(), Some("Lima"));
    }

    #[test]
    fn test_exact_tier_ignores_case_and_accents() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        let hits = engine.search("PEREZ", &records);
        assert_eq!(codes(&hits), vec![0]);

        let hits = engine.search("huamán", &records);
        assert_eq!(codes(&hits), vec![2]);
    }

    #[test]
    fn test_exact_tier_matches_several_in_input_order() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        let hits = engine.search("2025", &records);
        assert_eq!(codes(&hits), vec![0, 1, 2]);
        assert!(hits.iter().all(|h| h.score.tier == MatchTier::Exact));
    }

    #[test]
    fn test_partial_tier_terms_across_fields() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        // "maria cusco" is not a substring of any single field
        let hits = engine.search("María Cusco", &records);
        assert_eq!(codes(&hits), vec![1]);
        assert_eq!(hits[0].score.tier, MatchTier::Partial);
    }

    #[test]
    fn test_partial_tier_requires_every_term() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        // "maria" and "lima" each match a record, but never the same one
        let hits = engine.search("maria lima", &records);
        assert!(hits.iter().all(|h| h.score.tier != MatchTier::Partial));
    }

    #[test]
    fn test_fuzzy_tier_one_letter_missing() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        let hits = engine.search("lma", &records);
        assert_eq!(codes(&hits), vec![0]);
        assert_eq!(hits[0].score.tier, MatchTier::Fuzzy);
        assert!((hits[0].score.similarity - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_fuzzy_tier_orders_by_similarity() {
        let mut engine = SearchEngine::new();
        let records = vec![
            "arequipaa".to_string(),
            "arequpa".to_string(),
            "areqipa".to_string(),
            "arekipa".to_string(),
        ];
        // similarities to "arequipe": 7/9, 6/8, 6/8, 5/8
        let hits = engine.search("arequipe", &records);
        let order = codes(&hits);
        assert_eq!(order.first(), Some(&0));
        assert_eq!(&order[1..], &[1, 2, 3]);
    }

    #[test]
    fn test_no_match() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        assert!(engine.search("xqzw", &records).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        assert!(engine.search("", &records).is_empty());
        assert!(engine.search("   ", &records).is_empty());
        assert!(engine.search("?!", &records).is_empty());
        let none: Vec<PackageRecord> = Vec::new();
        assert!(engine.search("lima", &none).is_empty());
    }

    #[test]
    fn test_every_call_is_remembered() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        engine.search("", &records);
        engine.search("  ", &records);
        engine.search("  ", &records);
        assert_eq!(engine.history().get("").map(|e| e.frequency), Some(1));
        let blank = engine.history().get("  ").expect("blank query kept verbatim");
        assert_eq!(blank.frequency, 2);
        assert_eq!(blank.last_result_count, 0);

        let none: Vec<PackageRecord> = Vec::new();
        engine.search("lima", &none);
        assert_eq!(engine.history().get("lima").map(|e| e.frequency), Some(1));
        assert_eq!(engine.history().len(), 3);
    }

    #[test]
    fn test_exact_tier_stops_before_fuzzy() {
        let mut engine = SearchEngine::new();
        let records = vec!["lima".to_string(), "lime".to_string()];
        // "lime" would clear the fuzzy threshold at 0.75
        let hits = engine.search("lima", &records);
        assert_eq!(codes(&hits), vec![0]);
        assert_eq!(hits[0].score.tier, MatchTier::Exact);

        let hits = engine.search("lime", &records);
        assert_eq!(codes(&hits), vec![1]);
    }

    #[test]
    fn test_exact_tier_stops_before_partial() {
        let mut engine = SearchEngine::new();
        let records = vec![
            package("P1", "Ana", "San Isidro", "-", "-"),
            package("P2", "Isidro San", "Lima", "-", "-"),
        ];
        // only P2 needs the partial tier, so the exact hit on P1 wins alone
        let hits = engine.search("san isidro", &records);
        assert_eq!(codes(&hits), vec![0]);
        assert_eq!(hits[0].score.tier, MatchTier::Exact);
    }

    #[test]
    fn test_partial_tier_stops_before_fuzzy() {
        let mut engine = SearchEngine::new();
        let records = vec![
            package("P1", "Juan Pérez", "Lima", "-", "-"),
            package("P2", "Juan Lina", "Cusco", "-", "-"),
        ];
        // "juan lina" is 8/9 similar to the query, but P1 has every term
        let hits = engine.search("juan lima", &records);
        assert_eq!(codes(&hits), vec![0]);
        assert_eq!(hits[0].score.tier, MatchTier::Partial);
    }

    #[test]
    fn test_history_key_is_lowercase_only() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        engine.search("Lima ", &records);
        engine.search("Lima ", &records);

        let entries = engine.suggest_entries("lim");
        let lima = entries
            .iter()
            .find(|e| e.query == "lima ")
            .expect("trailing space kept in history key");
        assert_eq!(lima.frequency, 2);
        assert_eq!(lima.last_result_count, 1);
        assert!(engine.suggest("lim").contains(&"lima ".to_string()));
        assert!(engine.history().get("lima").is_none());
    }

    #[test]
    fn test_suggest_top_five_by_frequency() {
        let mut engine = SearchEngine::new();
        let records = fixtures();
        for (query, times) in [("pa", 1), ("pb", 4), ("pc", 2), ("pd", 6), ("pe", 3), ("pf", 5)] {
            for _ in 0..times {
                engine.search(query, &records);
            }
        }
        assert_eq!(engine.suggest("P"), vec!["pd", "pf", "pb", "pe", "pc"]);
    }

    #[test]
    fn test_with_config_validates() {
        let bad = SearchConfig {
            fuzzy_threshold: 1.5,
            ..SearchConfig::default()
        };
        assert!(SearchEngine::with_config(&bad).is_err());

        let strict = SearchConfig {
            fuzzy_threshold: 0.8,
            history_capacity: 10,
            suggestion_limit: 2,
        };
        let mut engine = SearchEngine::with_config(&strict).unwrap();
        let records = fixtures();
        // 0.75 no longer clears the threshold
        assert!(engine.search("lma", &records).is_empty());
        assert_eq!(engine.history().capacity(), 10);
    }
}
