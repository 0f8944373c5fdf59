//! Text normalization shared by queries and record fields

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Fold text into its comparable form
///
/// - lowercase
/// - canonical decomposition (NFD), dropping combining diacritics
/// - anything that is not `[A-Za-z0-9_]` or whitespace becomes a space
/// - runs of whitespace collapse to one space, ends trimmed
///
/// The output only contains `[a-z0-9_]` and single spaces, so normalizing
/// twice gives the same result as normalizing once.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .map(|c| {
            if is_word_char(c) {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_accents() {
        assert_eq!(normalize("Pérez"), "perez");
        assert_eq!(normalize("ÁREQUIPA"), "arequipa");
        assert_eq!(normalize("Ñaña"), "nana");
        assert_eq!(normalize("São Paulo"), "sao paulo");
    }

    #[test]
    fn test_decomposed_input() {
        // "e" followed by a combining acute accent
        assert_eq!(normalize("Jose\u{0301}"), "jose");
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(normalize("Av. Arequipa #123-B"), "av arequipa 123 b");
        assert_eq!(normalize("2025-ABC/1"), "2025 abc 1");
        assert_eq!(normalize("en_transito"), "en_transito");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(normalize("  Lima \t\n  Centro  "), "lima centro");
        assert_eq!(normalize("Lima "), "lima");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!! ¿? ..."), "");
    }

    #[test]
    fn test_non_latin_letters_are_dropped() {
        assert_eq!(normalize("Lima 東京"), "lima");
    }

    #[test]
    fn test_idempotent_examples() {
        for s in ["Pérez, Juan", "  A--B  ", "Ǆ ǅ ǆ", "Kelvin \u{212A}"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }
}
