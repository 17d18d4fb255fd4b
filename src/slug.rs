//! Slug normalization
//!
//! Turns a content title, in any supported language and charset, into a safe
//! ASCII path segment: the alias candidate the registry is asked to activate.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::charset::Charset;
use crate::charset::TextCodec;
use crate::config::Config;
use crate::text;
use crate::translit::Transliterator;

/// Anything outside the slug alphabet, including whitespace
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9/_-]+").expect("valid pattern"));

/// Why no slug could be generated
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationFailure {
    /// The title carries nothing to derive a name from
    #[error("title is empty, nothing to derive a mapping from")]
    EmptySource,
}

/// Title to path-segment normalization
///
/// Pure: the same title and language always produce the same candidate, so
/// repeated autogeneration attempts cannot drift.
pub struct SlugNormalizer {
    /// Charset conversion for titles not already in UTF-8
    codec: TextCodec,

    /// Language-aware ASCII substitution
    translit: Transliterator,

    /// Whether autogeneration is offered at all
    autogen_enabled: bool,
}

impl SlugNormalizer {
    /// Build a normalizer from the crate configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            codec: TextCodec::new(config),
            translit: Transliterator::new(config),
            autogen_enabled: config.autogen_enabled,
        }
    }

    /// Is mapping autogeneration offered at all?
    #[must_use]
    pub fn autogen_enabled(&self) -> bool {
        self.autogen_enabled
    }

    /// The codec used for non-UTF-8 titles
    #[must_use]
    pub fn codec(&self) -> &TextCodec {
        &self.codec
    }

    /// Normalize a title into a slug candidate
    ///
    /// The pipeline: trim and reject empty sources, transliterate to ASCII
    /// for the given language, lowercase, turn every run of whitespace and
    /// disallowed characters into a separator, collapse duplicate separators
    /// and strip them from the edges.
    ///
    /// # Errors
    ///
    /// [`GenerationFailure::EmptySource`] when nothing usable remains after
    /// trimming, the caller reports it and continues with other languages
    pub fn normalize(&self, title: &str, language: Option<&str>) -> Result<String, GenerationFailure> {
        let trimmed = title.trim();

        if trimmed.is_empty() {
            return Err(GenerationFailure::EmptySource);
        }

        let ascii = self.translit.transliterate(trimmed, language);
        let lowered = text::lowercase(&ascii);

        let replaced = DISALLOWED.replace_all(&lowered, "-");
        let collapsed = collapse_separators(&replaced);
        let slug = collapsed.trim_matches(['-', '_', '/']).to_string();

        if slug.is_empty() {
            // title was all punctuation or placeholders
            return Err(GenerationFailure::EmptySource);
        }

        Ok(slug)
    }

    /// Normalize a title supplied as raw bytes in an arbitrary charset
    ///
    /// # Errors
    ///
    /// Same as [`normalize`](Self::normalize); charset conversion itself is
    /// best-effort and never fails
    pub fn normalize_bytes(
        &self,
        title: &[u8],
        charset: &Charset,
        language: Option<&str>,
    ) -> Result<String, GenerationFailure> {
        let utf8 = self.codec.decode_utf8(title, charset);

        self.normalize(&utf8, language)
    }
}

/// Normalize a hand-typed mapping
///
/// Hand-typed values arrive in whatever shape the administrator pasted:
/// percent-encoded, with surrounding slashes, with a query string tacked on.
/// The result is relative to the site root with no leading or trailing slash;
/// anything from the first `?` or `#` on is dropped.
#[must_use]
pub fn clean_uri(input: &str) -> String {
    let decoded = percent_decode_str(input.trim())
        .decode_utf8()
        .map_or_else(|_| input.trim().to_string(), |decoded| decoded.into_owned());

    let cut = decoded
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut segments = Vec::new();

    for segment in cut.split('/') {
        let segment = segment.trim();

        if !segment.is_empty() {
            segments.push(segment);
        }
    }

    segments.join("/")
}

/// Collapse every run of separators down to one
///
/// A run containing a slash keeps the slash, path boundaries win; any other
/// run keeps its first character.
fn collapse_separators(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut run: Option<char> = None;

    for ch in input.chars() {
        if matches!(ch, '-' | '_' | '/') {
            match run {
                None => run = Some(ch),
                Some(current) if current != '/' && ch == '/' => run = Some('/'),
                Some(_) => {}
            }
        } else {
            if let Some(separator) = run.take() {
                output.push(separator);
            }

            output.push(ch);
        }
    }

    if let Some(separator) = run {
        output.push(separator);
    }

    output
}
