//! Fuzzy matching by Levenshtein edit distance
//!
//! Insert, delete and substitute all cost 1; transpositions are not special.

/// Similarity a field must exceed for a fuzzy match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.6;

/// Classic dynamic-programming edit distance over chars
///
/// Keeps two rows of the matrix instead of the whole table.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (cur[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    prev[b.len()]
}

/// `1 - distance / max(len)`, in `[0, 1]`
///
/// Two empty strings are identical and score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

/// Threshold-based fuzzy matcher over already-normalized text
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Best similarity between `needle` and any of `haystacks`, if it clears the threshold
    pub fn best_match<'a, I>(&self, needle: &str, haystacks: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a str>,
    {
        haystacks
            .into_iter()
            .map(|field| similarity(needle, field))
            .filter(|score| *score > self.threshold)
            .fold(None, |best: Option<f64>, score| {
                Some(best.map_or(score, |b| b.max(score)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("lima", "lma"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("cusco", "cusco"), 0);
    }

    #[test]
    fn test_no_transposition_shortcut() {
        // A swap costs two substitutions
        assert_eq!(levenshtein("ab", "ba"), 2);
    }

    #[test]
    fn test_similarity() {
        assert!((similarity("lma", "lima") - 0.75).abs() < 1e-12);
        assert_eq!(similarity("piura", "piura"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let matcher = FuzzyMatcher::default();
        // 2 edits over 5 chars: exactly 0.6, not a match
        assert!((similarity("cusco", "cuzko") - 0.6).abs() < 1e-12);
        assert_eq!(matcher.best_match("cusco", ["cuzko"]), None);
        assert!(matcher.best_match("cusco", ["cuzco"]).is_some());
    }

    #[test]
    fn test_best_match_takes_highest() {
        let matcher = FuzzyMatcher::default();
        let best = matcher.best_match("arequipa", ["lima", "arequpa", "arequipa"]);
        assert_eq!(best, Some(1.0));
        assert_eq!(matcher.best_match("arequipa", Vec::<&str>::new()), None);
    }
}
