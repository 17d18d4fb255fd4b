//! Charset-aware string primitives
//!
//! Multibyte-correct length, substring, case folding, search and regex
//! operations. Callers get the same answers whether the subject came out of
//! the Unicode-aware conversion backend or a byte-oriented fallback; regex
//! operations treat subjects as UTF-8 and degrade to an ASCII-transliterated
//! copy when the bytes are not valid UTF-8.

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::translit::Transliterator;

/// Character length of a string (code points, not bytes)
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Grapheme-cluster length of a string
///
/// What a reader would count as characters; "e\u{301}" is one
#[must_use]
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Part of a string, by character offsets
///
/// `length` of `None` takes everything from `start` to the end
#[must_use]
pub fn substr(text: &str, start: usize, length: Option<usize>) -> String {
    let chars = text.chars().skip(start);

    match length {
        Some(length) => chars.take(length).collect(),
        None => chars.collect(),
    }
}

/// Character offset of the first occurrence of `needle`, at or after `offset`
#[must_use]
pub fn position(haystack: &str, needle: &str, offset: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let skipped: String = haystack.chars().skip(offset).collect();

    skipped
        .find(needle)
        .map(|byte_index| offset + skipped[..byte_index].chars().count())
}

/// Lowercase with the full Unicode case tables
#[must_use]
pub fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

/// Uppercase with the full Unicode case tables
#[must_use]
pub fn uppercase(text: &str) -> String {
    text.to_uppercase()
}

/// Byte-wise ASCII lowering, the fallback for subjects that are not text
#[must_use]
pub fn lowercase_bytes(input: &[u8]) -> Vec<u8> {
    input.iter().map(u8::to_ascii_lowercase).collect()
}

/// Is every character alphabetic? Empty strings are not
#[must_use]
pub fn is_alpha(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_alphabetic)
}

/// Regex match over a possibly non-UTF-8 subject
///
/// Invalid UTF-8 never fails the call: the subject is retried as an
/// ASCII-transliterated copy
#[must_use]
pub fn regex_is_match(subject: &[u8], pattern: &Regex, translit: &Transliterator) -> bool {
    match core::str::from_utf8(subject) {
        Ok(text) => pattern.is_match(text),
        Err(_) => pattern.is_match(&ascii_fallback(subject, translit)),
    }
}

/// Regex replace over a possibly non-UTF-8 subject
///
/// Same degradation rule as [`regex_is_match`]: on invalid UTF-8 the
/// replacement runs against an ASCII-transliterated copy
#[must_use]
pub fn regex_replace_all(
    subject: &[u8],
    pattern: &Regex,
    replacement: &str,
    translit: &Transliterator,
) -> String {
    match core::str::from_utf8(subject) {
        Ok(text) => pattern.replace_all(text, replacement).into_owned(),
        Err(_) => pattern
            .replace_all(&ascii_fallback(subject, translit), replacement)
            .into_owned(),
    }
}

/// ASCII rendition of arbitrary bytes
///
/// Bytes are read as Latin-1 (every byte is a code point) and transliterated
/// down to ASCII, which can never fail
fn ascii_fallback(subject: &[u8], translit: &Transliterator) -> String {
    let latin1: String = subject.iter().map(|&byte| char::from(byte)).collect();

    translit.transliterate(&latin1, None)
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use crate::config::Config;

    use super::*;

    static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("valid pattern"));

    fn translit() -> Transliterator {
        Transliterator::new(&Config::default())
    }

    #[test]
    fn test_char_len_counts_code_points() {
        assert_eq!(4, char_len("Café"));
        assert_eq!(5, char_len("Cafe\u{301}"));
    }

    #[test]
    fn test_grapheme_len_counts_clusters() {
        assert_eq!(4, grapheme_len("Café"));
        assert_eq!(4, grapheme_len("Cafe\u{301}"));
    }

    #[test]
    fn test_substr_by_characters() {
        assert_eq!("fé", substr("Café", 2, None));
        assert_eq!("af", substr("Café", 1, Some(2)));
        assert_eq!("", substr("Café", 9, None));
    }

    #[test]
    fn test_position_by_characters() {
        assert_eq!(Some(3), position("Café au lait", "é", 0));
        assert_eq!(Some(8), position("Café au lait", "la", 0));
        assert_eq!(None, position("Café", "x", 0));
        assert_eq!(None, position("Café", "C", 1));
    }

    #[test]
    fn test_case_folding() {
        assert_eq!("straße", lowercase("STRAßE"));
        assert_eq!("CAFÉ", uppercase("café"));
        assert_eq!(b"cafe".to_vec(), lowercase_bytes(b"CaFe"));
    }

    #[test]
    fn test_is_alpha() {
        assert!(is_alpha("Café"));
        assert!(!is_alpha("Cafe9"));
        assert!(!is_alpha(""));
    }

    #[test]
    fn test_regex_on_valid_utf8() {
        assert!(regex_is_match("hello".as_bytes(), &WORD, &translit()));
    }

    #[test]
    fn test_regex_falls_back_on_invalid_utf8() {
        // 0xE9 alone is not valid UTF-8, fallback reads it as Latin-1 é -> e
        let subject = [0x63, 0x61, 0x66, 0xE9];

        assert!(regex_is_match(&subject, &WORD, &translit()));
        assert_eq!(
            "-",
            regex_replace_all(&subject, &WORD, "-", &translit())
        );
    }
}
