//! Charset conversion
//!
//! Converts byte strings between character encodings, trying successive
//! backends until one succeeds. Conversion is best-effort by contract: when
//! every backend declines, the input comes back unconverted instead of an
//! error, so alias generation never blocks on a missing capability.

use std::collections::BTreeMap;

use crate::config::Config;

/// Payload size above which the direct Latin-1 transform steps aside (16 MiB)
const DIRECT_TRANSFORM_LIMIT: usize = 16 * 1024 * 1024;

/// A character set label
///
/// Labels compare case-insensitively, `"UTF-8"` and `"utf-8"` are the same
/// charset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Charset(String);

impl Charset {
    /// Create a charset from a label
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_ascii_lowercase())
    }

    /// The canonical (lowercased) label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0
    }

    /// Is this a UTF-8 label?
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        matches!(self.0.as_str(), "utf-8" | "utf8")
    }

    /// Is this an ASCII or Latin-1 label?
    #[must_use]
    pub fn is_latin1(&self) -> bool {
        matches!(
            self.0.as_str(),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" | "us-ascii" | "ascii"
        )
    }
}

impl From<&str> for Charset {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl core::fmt::Display for Charset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single conversion backend
///
/// Backends are held in priority order; the first one returning output wins
pub trait CharsetBackend: Send + Sync {
    /// Backend name, for logging
    fn name(&self) -> &'static str;

    /// Queried once when the codec is built; unavailable backends are dropped
    fn is_available(&self) -> bool;

    /// Attempt a conversion, `None` when this backend cannot handle the pair
    fn convert(&self, input: &[u8], from: &Charset, to: &Charset) -> Option<Vec<u8>>;
}

/// Direct ASCII/Latin-1 ⇄ UTF-8 transform
///
/// The overwhelmingly common pair in practice, handled without table lookups.
/// Large payloads are left to the generic backend.
struct DirectLatin1;

impl CharsetBackend for DirectLatin1 {
    fn name(&self) -> &'static str {
        "direct-latin1"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn convert(&self, input: &[u8], from: &Charset, to: &Charset) -> Option<Vec<u8>> {
        if input.len() >= DIRECT_TRANSFORM_LIMIT {
            return None;
        }

        if from.is_latin1() && to.is_utf8() {
            // every Latin-1 byte is the identically numbered code point
            let text: String = input.iter().map(|&byte| char::from(byte)).collect();

            return Some(text.into_bytes());
        }

        if from.is_utf8() && to.is_latin1() {
            let text = core::str::from_utf8(input).ok()?;

            let bytes = text
                .chars()
                .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
                .collect();

            return Some(bytes);
        }

        None
    }
}

/// Generic converter over the WHATWG encoding tables
struct WhatwgTables;

impl CharsetBackend for WhatwgTables {
    fn name(&self) -> &'static str {
        "whatwg-tables"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn convert(&self, input: &[u8], from: &Charset, to: &Charset) -> Option<Vec<u8>> {
        let from_encoding = encoding_rs::Encoding::for_label(from.label().as_bytes())?;
        let to_encoding = encoding_rs::Encoding::for_label(to.label().as_bytes())?;

        // lossy on both legs, malformed sequences become replacement characters
        let (decoded, _, _) = from_encoding.decode(input);
        let (encoded, _, _) = to_encoding.encode(&decoded);

        Some(encoded.into_owned())
    }
}

/// Charset conversion with fallback backends
pub struct TextCodec {
    /// Charset assumed when callers do not specify one
    default_charset: Charset,

    /// Available backends, priority order
    backends: Vec<Box<dyn CharsetBackend>>,
}

impl TextCodec {
    /// Build the codec, probing each backend for availability once
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let candidates: Vec<Box<dyn CharsetBackend>> =
            vec![Box::new(DirectLatin1), Box::new(WhatwgTables)];

        let backends: Vec<Box<dyn CharsetBackend>> = candidates
            .into_iter()
            .filter(|backend| backend.is_available())
            .collect();

        Self {
            default_charset: Charset::new(&config.default_charset),
            backends,
        }
    }

    /// The charset assumed when none is specified
    #[must_use]
    pub fn default_charset(&self) -> &Charset {
        &self.default_charset
    }

    /// Convert a byte string between charsets
    ///
    /// Best-effort: when no backend can handle the pair the input is returned
    /// unconverted. Identical labels are a no-op.
    #[must_use]
    pub fn convert(&self, input: &[u8], from: &Charset, to: &Charset) -> Vec<u8> {
        if from == to {
            return input.to_vec();
        }

        for backend in &self.backends {
            if let Some(output) = backend.convert(input, from, to) {
                return output;
            }
        }

        tracing::debug!("no backend converts {from} to {to}, returning input unchanged");

        input.to_vec()
    }

    /// Convert every key and value of a map
    #[must_use]
    pub fn convert_map(
        &self,
        input: &BTreeMap<Vec<u8>, Vec<u8>>,
        from: &Charset,
        to: &Charset,
    ) -> BTreeMap<Vec<u8>, Vec<u8>> {
        input
            .iter()
            .map(|(key, value)| (self.convert(key, from, to), self.convert(value, from, to)))
            .collect()
    }

    /// Decode a byte string into UTF-8 text
    ///
    /// Bytes the conversion could not account for come through as replacement
    /// characters rather than an error
    #[must_use]
    pub fn decode_utf8(&self, input: &[u8], from: &Charset) -> String {
        let converted = self.convert(input, from, &Charset::new("utf-8"));

        String::from_utf8_lossy(&converted).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TextCodec {
        TextCodec::new(&Config::default())
    }

    #[test]
    fn test_same_charset_is_noop() {
        let input = vec![0xFF, 0xFE, 0x00];

        let output = codec().convert(&input, &Charset::new("UTF-8"), &Charset::new("utf-8"));

        assert_eq!(input, output);
    }

    #[test]
    fn test_latin1_to_utf8() {
        // "Café" in Latin-1
        let input = [0x43, 0x61, 0x66, 0xE9];

        let output = codec().convert(&input, &Charset::new("iso-8859-1"), &Charset::new("utf-8"));

        assert_eq!("Café".as_bytes(), &output[..]);
    }

    #[test]
    fn test_utf8_to_latin1() {
        let output = codec().convert(
            "Café".as_bytes(),
            &Charset::new("utf-8"),
            &Charset::new("iso-8859-1"),
        );

        assert_eq!(vec![0x43, 0x61, 0x66, 0xE9], output);
    }

    #[test]
    fn test_utf8_to_latin1_unrepresentable() {
        let output = codec().convert(
            "€".as_bytes(),
            &Charset::new("utf-8"),
            &Charset::new("latin1"),
        );

        assert_eq!(b"?".to_vec(), output);
    }

    #[test]
    fn test_windows_1252_through_tables() {
        // 0x80 is the euro sign in windows-1252
        let output = codec().convert(&[0x80], &Charset::new("windows-1252"), &Charset::new("utf-8"));

        assert_eq!("€".as_bytes(), &output[..]);
    }

    #[test]
    fn test_unknown_charset_fails_open() {
        let input = b"anything".to_vec();

        let output = codec().convert(&input, &Charset::new("no-such-charset"), &Charset::new("utf-8"));

        assert_eq!(input, output);
    }

    #[test]
    fn test_map_conversion_covers_keys_and_values() {
        let mut input = BTreeMap::new();
        input.insert(vec![0xE9], vec![0x43, 0x61, 0x66, 0xE9]);

        let output = codec().convert_map(
            &input,
            &Charset::new("iso-8859-1"),
            &Charset::new("utf-8"),
        );

        assert_eq!(
            Some(&"Café".as_bytes().to_vec()),
            output.get("é".as_bytes())
        );
    }

    #[test]
    fn test_decode_utf8_replaces_invalid_sequences() {
        let decoded = codec().decode_utf8(&[0x61, 0xFF, 0x62], &Charset::new("utf-8"));

        assert_eq!("a\u{FFFD}b", decoded);
    }
}
