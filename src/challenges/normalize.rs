//! Custom challenge text normalization.
//!
//! Submitted text is reduced to what a standard keyboard can type:
//! printable ASCII (0x20..=0x7E) plus newline.

use icu_normalizer::DecomposingNormalizerBorrowed;

use crate::models::ChallengeError;

pub const MIN_CUSTOM_LEN: usize = 50;
pub const MAX_CUSTOM_LEN: usize = 2000;

fn canonical(c: char) -> Option<&'static str> {
    let replacement = match c {
        '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{201A}' | '\u{2039}' | '\u{203A}'
        | '\u{00B4}' | '\u{0060}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => "\"",
        '\u{2010}'..='\u{2015}' | '\u{2212}' => "-",
        '\u{2026}' => "...",
        '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{2028}' | '\u{2029}'
        | '\u{202F}' | '\u{205F}' | '\u{3000}' => " ",
        '\u{200B}'..='\u{200D}' | '\u{FEFF}' => "",
        '\t' => "    ",
        _ => return None,
    };
    Some(replacement)
}

fn is_typeable(c: char) -> bool {
    c == '\n' || (' '..='~').contains(&c)
}

/// Canonicalize punctuation and whitespace, fold accented letters to their
/// base letter, drop everything outside the typeable set, and trim.
pub fn normalize_content(raw: &str) -> String {
    let mut mapped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match canonical(c) {
            Some(rep) => mapped.push_str(rep),
            None => mapped.push(c),
        }
    }

    // NFD splits "é" into "e" + U+0301; the combining mark is then filtered out.
    let decomposed = DecomposingNormalizerBorrowed::new_nfd().normalize(&mapped);
    let filtered: String = decomposed.chars().filter(|c| is_typeable(*c)).collect();
    filtered.trim().to_string()
}

/// Normalize and enforce the custom challenge length bounds on the result.
pub fn validate_custom_content(raw: &str) -> Result<String, ChallengeError> {
    let normalized = normalize_content(raw);
    let len = normalized.chars().count();
    if !(MIN_CUSTOM_LEN..=MAX_CUSTOM_LEN).contains(&len) {
        return Err(ChallengeError::ContentLength {
            len,
            min: MIN_CUSTOM_LEN,
            max: MAX_CUSTOM_LEN,
        });
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_punctuation_is_canonicalized() {
        let raw = "caf\u{00E9} \u{2014} it\u{2019}s \u{201C}special\u{201D}";
        assert_eq!(normalize_content(raw), "cafe - it's \"special\"");
    }

    #[test]
    fn test_zero_width_and_unicode_spaces() {
        let raw = "a\u{200B}b\u{00A0}c\u{3000}d\u{FEFF}";
        assert_eq!(normalize_content(raw), "ab c d");
    }

    #[test]
    fn test_ellipsis_tabs_and_newlines() {
        assert_eq!(normalize_content("wait\u{2026}"), "wait...");
        assert_eq!(normalize_content("fn x()\n\tbody"), "fn x()\n    body");
    }

    #[test]
    fn test_untypeable_characters_dropped_and_trimmed() {
        assert_eq!(normalize_content("  \u{1F600}hello\u{4E16}  "), "hello");
        assert_eq!(normalize_content("\r\nline\r\n"), "line");
    }

    #[test]
    fn test_length_checked_after_normalization() {
        // 60 raw chars, but only 30 survive normalization
        let raw = format!("{}{}", "a".repeat(30), "\u{200B}".repeat(30));
        assert_eq!(raw.chars().count(), 60);
        assert_eq!(
            validate_custom_content(&raw),
            Err(ChallengeError::ContentLength {
                len: 30,
                min: 50,
                max: 2000
            })
        );
    }

    #[test]
    fn test_length_bounds_inclusive() {
        assert!(validate_custom_content(&"a".repeat(50)).is_ok());
        assert!(validate_custom_content(&"a".repeat(2000)).is_ok());
        assert!(validate_custom_content(&"a".repeat(2001)).is_err());
    }
}
