//! Storefront languages
//!
//! The language catalog is owned by the surrounding application; mapping
//! operations iterate whatever list the caller supplies.

/// Identifier of a storefront language
pub type LanguageId = i32;

/// A storefront language
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Language {
    /// Storefront id, keys the per-language mapping rows
    pub id: LanguageId,

    /// ISO 639 code, drives transliteration choices
    pub code: String,

    /// Display name
    pub name: String,
}

impl Language {
    /// Create a language entry
    #[must_use]
    pub fn new(id: LanguageId, code: &str, name: &str) -> Self {
        Self {
            id,
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}
