//! URI mappings
//!
//! The records the registry stores: one path alias per content item, language
//! and lifetime state.

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::languages::LanguageId;

/// Kind of content item a mapping points at
///
/// An alias is a global namespace per language, shared by every content type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(
    feature = "postgres",
    derive(sqlx::Type),
    sqlx(type_name = "content_type", rename_all = "kebab-case")
)]
pub enum ContentType {
    /// Informational page
    Page,

    /// Product, possibly filed under several category paths
    Product,

    /// Product category
    Category,

    /// Manufacturer listing
    Manufacturer,
}

impl ContentType {
    /// Lowercase label, used in logging and storage
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Product => "product",
            Self::Category => "category",
            Self::Manufacturer => "manufacturer",
        }
    }
}

impl core::fmt::Display for ContentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifetime state of a mapping
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(
    feature = "postgres",
    derive(sqlx::Type),
    sqlx(type_name = "mapping_status", rename_all = "kebab-case")
)]
pub enum MappingStatus {
    /// The current, authoritative mapping for its content item
    Active,

    /// Superseded, retained so old links keep resolving
    Historical,
}

/// Reference to a content item within its type's identity space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ContentRef {
    /// Content type discriminator
    pub content_type: ContentType,

    /// Identifier within that type
    pub content_id: i32,
}

impl ContentRef {
    /// Create a content reference
    #[must_use]
    pub fn new(content_type: ContentType, content_id: i32) -> Self {
        Self {
            content_type,
            content_id,
        }
    }
}

impl core::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.content_type, self.content_id)
    }
}

/// A single URI mapping record
#[derive(Clone, Debug, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Mapping {
    /// Record ID
    pub id: Uuid,

    /// Normalized path, no leading or trailing slash
    pub uri: String,

    /// Storefront language the mapping serves
    pub language_id: LanguageId,

    /// Content type discriminator
    pub content_type: ContentType,

    /// Identifier of the referenced content item within its type
    pub content_id: i32,

    /// Extra routing data when the content id alone is ambiguous
    pub query_fragment: Option<String>,

    /// Lifetime state
    pub status: MappingStatus,

    /// Creation date, orders the history of a content item
    pub created_at: NaiveDateTime,
}

impl Mapping {
    /// Is this the authoritative mapping for its content item?
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MappingStatus::Active
    }

    /// The content item this mapping resolves to
    #[must_use]
    pub fn content_ref(&self) -> ContentRef {
        ContentRef::new(self.content_type, self.content_id)
    }
}
