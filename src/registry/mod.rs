//! All things related to the storage of URI mappings
//!
//! The registry owns the uniqueness of active mappings, retires superseded
//! ones into history and deletes whole record sets when content items go
//! away. Two implementations: [`Memory`] for tests and ephemeral use, and a
//! Postgres store behind the `postgres` feature.

use async_trait::async_trait;
use thiserror::Error;

use crate::languages::LanguageId;
use crate::mappings::ContentRef;
use crate::mappings::ContentType;
use crate::mappings::Mapping;
use crate::mappings::MappingStatus;

pub use memory::Memory;
#[cfg(feature = "postgres")]
pub use postgres::Postgres;

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Registry errors
#[derive(Debug, Error)]
pub enum Error {
    /// The uri is already active for a different content item
    #[error(r#"mapping "{uri}" is already active for language {language_id}"#)]
    Collision {
        /// The contested uri
        uri: String,

        /// Language the collision happened in
        language_id: LanguageId,
    },

    /// A failure in the persistence layer
    #[error("store error: {0}")]
    Store(String),
}

/// Result type for all registry interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to insert a mapping
pub struct InsertMappingValues<'a> {
    /// Normalized uri, relative to the site root
    pub uri: &'a str,

    /// Storefront language the mapping serves
    pub language_id: LanguageId,

    /// Content item the mapping resolves to
    pub content: ContentRef,

    /// Extra routing data when the content id alone is ambiguous
    pub query_fragment: Option<&'a str>,
}

/// Result of a successful insert
#[derive(Debug)]
pub enum InsertOutcome {
    /// A new active mapping was created
    Inserted(Mapping),

    /// The same content item already holds this uri, nothing changed
    Unchanged(Mapping),
}

impl InsertOutcome {
    /// The mapping the operation settled on, new or pre-existing
    #[must_use]
    pub fn mapping(&self) -> &Mapping {
        match self {
            Self::Inserted(mapping) | Self::Unchanged(mapping) => mapping,
        }
    }
}

/// Filter for listing mappings
///
/// Unset fields match everything
#[derive(Clone, Debug, Default)]
pub struct MappingFilter {
    /// Restrict to one content type
    pub content_type: Option<ContentType>,

    /// Restrict to one content item
    pub content_id: Option<i32>,

    /// Restrict to one storefront language
    pub language_id: Option<LanguageId>,

    /// Restrict to active or historical records
    pub status: Option<MappingStatus>,
}

impl MappingFilter {
    /// Everything recorded for one content item, any language, any status
    #[must_use]
    pub fn for_content(content: ContentRef) -> Self {
        Self {
            content_type: Some(content.content_type),
            content_id: Some(content.content_id),
            ..Self::default()
        }
    }

    /// Does a mapping pass this filter?
    #[must_use]
    pub fn matches(&self, mapping: &Mapping) -> bool {
        self.content_type.is_none_or(|t| mapping.content_type == t)
            && self.content_id.is_none_or(|id| mapping.content_id == id)
            && self.language_id.is_none_or(|id| mapping.language_id == id)
            && self.status.is_none_or(|status| mapping.status == status)
    }
}

/// Registry of URI mappings with all supported operations
#[async_trait]
pub trait Registry: Clone + Send + Sync + 'static {
    /// Find the active mapping of a content item in one language
    async fn find_active(
        &self,
        content: ContentRef,
        language_id: LanguageId,
    ) -> Result<Option<Mapping>>;

    /// Find the mapping holding a uri
    ///
    /// Prefers the active holder; with none, the most recent historical
    /// record comes back so old links can still be resolved
    async fn find_by_uri(&self, uri: &str, language_id: LanguageId) -> Result<Option<Mapping>>;

    /// Insert a new active mapping
    ///
    /// Uniqueness is enforced by the store in the same step as the write,
    /// never as a separate pre-check. Re-submitting the uri a content item
    /// already actively holds is a no-op success.
    ///
    /// # Errors
    ///
    /// [`Error::Collision`] when the uri is active for a different content
    /// item, [`Error::Store`] on persistence failure
    async fn insert(&self, values: &InsertMappingValues<'_>) -> Result<InsertOutcome>;

    /// Demote the active mapping of a uri to historical
    ///
    /// Idempotent, a uri without an active mapping is not an error
    async fn retire(&self, uri: &str, language_id: LanguageId) -> Result<()>;

    /// Retire `previous` and insert `values` as one atomic step
    ///
    /// On collision nothing is retired and the previous mapping stays
    /// active, a content item is never left without a resolvable alias by a
    /// failed rename
    async fn replace(
        &self,
        previous: Option<&str>,
        values: &InsertMappingValues<'_>,
    ) -> Result<InsertOutcome>;

    /// Remove every record of a content item, active and historical
    ///
    /// Only for permanent deletion of the content item itself; returns the
    /// number of removed records
    async fn delete_all(&self, content: ContentRef) -> Result<u64>;

    /// List mappings matching a filter, newest first
    ///
    /// Every call issues a fresh query, no cursor state is kept between
    /// calls
    async fn list(&self, filter: &MappingFilter) -> Result<Vec<Mapping>>;
}
