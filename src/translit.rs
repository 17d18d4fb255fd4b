//! Transliteration of non-ASCII code points
//!
//! Maps each non-ASCII code point to an ASCII substitute, language-sensitive
//! where languages disagree: German turns ö into oe, the generic table turns
//! it into o. Pure and deterministic, identical input and language always
//! yield identical output — autogenerated aliases must not drift between
//! attempts.

use unicode_normalization::UnicodeNormalization;

use crate::config::Config;

/// Substitutions that differ per language, keyed by (code point, ISO 639 code)
///
/// Everything not listed here falls through to the generic table
const LANGUAGE_TABLE: &[(char, &str, &str)] = &[
    // German umlauts and sharp s
    ('ä', "de", "ae"),
    ('Ä', "de", "Ae"),
    ('ö', "de", "oe"),
    ('Ö', "de", "Oe"),
    ('ü', "de", "ue"),
    ('Ü', "de", "Ue"),
    ('ß', "de", "ss"),
    // Danish and Norwegian
    ('å', "da", "aa"),
    ('Å', "da", "Aa"),
    ('ø', "da", "oe"),
    ('Ø', "da", "Oe"),
    ('æ', "da", "ae"),
    ('Æ', "da", "Ae"),
    ('å', "no", "aa"),
    ('Å', "no", "Aa"),
    ('ø', "no", "oe"),
    ('Ø', "no", "Oe"),
    ('æ', "no", "ae"),
    ('Æ', "no", "Ae"),
];

/// Language-aware ASCII transliteration
pub struct Transliterator {
    /// Substitute for code points without any known transliteration
    placeholder: char,
}

impl Transliterator {
    /// Build a transliterator with the configured placeholder
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            placeholder: config.placeholder_char,
        }
    }

    /// Transliterate UTF-8 text to ASCII
    ///
    /// Input is NFC-normalized first so composed and decomposed forms of the
    /// same character transliterate identically. Code points with no known
    /// substitute become the placeholder character.
    #[must_use]
    pub fn transliterate(&self, input: &str, language: Option<&str>) -> String {
        let language = language.map(str::trim).filter(|code| !code.is_empty());

        let mut output = String::with_capacity(input.len());

        for ch in input.nfc() {
            if ch.is_ascii() {
                output.push(ch);
                continue;
            }

            if let Some(substitute) = language.and_then(|code| language_substitute(ch, code)) {
                output.push_str(substitute);
                continue;
            }

            match deunicode::deunicode_char(ch) {
                Some(substitute) => output.push_str(substitute),
                None => output.push(self.placeholder),
            }
        }

        output
    }
}

/// Exact (code point, language) lookup
fn language_substitute(ch: char, language: &str) -> Option<&'static str> {
    LANGUAGE_TABLE
        .iter()
        .find(|(entry_char, entry_language, _)| {
            *entry_char == ch && entry_language.eq_ignore_ascii_case(language)
        })
        .map(|(_, _, substitute)| *substitute)
}
