//! Page mappings
//!
//! The simplest content type: one title, one mapping target per language,
//! nothing to disambiguate

use crate::mappings::ContentType;

use super::ContentTypeHandler;

/// Handler for informational pages
#[derive(Clone, Copy, Debug, Default)]
pub struct PageHandler;

impl PageHandler {
    /// Create a page handler
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ContentTypeHandler for PageHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Page
    }
}
