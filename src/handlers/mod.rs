//! Content-type handlers
//!
//! One handler per content type plugs that type into the registry. The
//! insert/update/delete lifecycle is shared default behavior; a handler
//! contributes its discriminator and whatever nesting or routing data its
//! type needs. New content types implement the trait, nothing dispatches
//! through a hierarchy.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::languages::Language;
use crate::languages::LanguageId;
use crate::mappings::ContentRef;
use crate::mappings::ContentType;
use crate::mappings::MappingStatus;
use crate::registry;
use crate::registry::InsertMappingValues;
use crate::registry::InsertOutcome;
use crate::registry::MappingFilter;
use crate::registry::Registry;
use crate::slug;
use crate::slug::GenerationFailure;
use crate::slug::SlugNormalizer;

pub use pages::PageHandler;
pub use products::ProductHandler;

mod pages;
mod products;

/// Outcome of a mapping operation for one language
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingOutcome {
    /// A mapping was created where none existed
    Inserted {
        /// The activated uri
        uri: String,
    },

    /// The previous mapping was retired and a new one activated
    Updated {
        /// The activated uri
        uri: String,
    },

    /// The previous mapping was retired with no replacement, the item stays
    /// reachable through non-aliased addressing only
    RetiredOnly,

    /// Proposed mapping equals the current one, nothing to do
    Unchanged,

    /// The uri is already active for a different content item, the previous
    /// mapping was left untouched
    Collision {
        /// The contested uri
        uri: String,
    },

    /// No slug could be generated from the title
    GenerationFailed(GenerationFailure),

    /// The store failed for this language, other languages proceed
    /// independently
    StoreFailed(String),
}

/// One outcome per storefront language
#[derive(Clone, Debug, Serialize)]
pub struct LanguageOutcome {
    /// The language this outcome belongs to
    pub language_id: LanguageId,

    /// What happened
    pub outcome: MappingOutcome,
}

/// Per-language input of a save operation
#[derive(Clone, Debug, Default)]
pub struct LanguageFields {
    /// Title of the content item in this language
    pub title: String,

    /// Hand-typed mapping, used when autogeneration is off
    pub typed_uri: String,

    /// Mapping the edit form was loaded with, empty when none existed
    pub previous_uri: String,
}

/// A content save event, as the admin surface reports it
#[derive(Clone, Debug)]
pub struct SaveRequest {
    /// The content item being inserted or updated
    pub content_id: i32,

    /// Titles and mapping fields keyed by language id
    pub fields: HashMap<LanguageId, LanguageFields>,

    /// Whether the administrator asked for autogenerated mappings
    pub autogenerate: bool,
}

/// Shared mapping lifecycle of a content type
#[async_trait]
pub trait ContentTypeHandler: Send + Sync {
    /// Discriminator of this handler's content type
    fn content_type(&self) -> ContentType;

    /// Extra routing data for a content item, when its id alone is ambiguous
    fn query_fragment(&self, content_id: i32) -> Option<String> {
        let _ = content_id;

        None
    }

    /// Path prefix generated slugs are nested under
    fn base_path(&self, content_id: i32, language: &Language) -> Option<String> {
        let _ = (content_id, language);

        None
    }

    /// Drive the insert/update lifecycle for every storefront language
    ///
    /// Languages fail independently: a collision or store failure in one
    /// produces that language's outcome and the rest still run
    async fn on_save<R: Registry>(
        &self,
        registry: &R,
        normalizer: &SlugNormalizer,
        languages: &[Language],
        request: &SaveRequest,
    ) -> Vec<LanguageOutcome> {
        let mut outcomes = Vec::with_capacity(languages.len());

        for language in languages {
            let fields = request.fields.get(&language.id).cloned().unwrap_or_default();

            let outcome = self
                .apply_language(registry, normalizer, language, request, &fields)
                .await;

            tracing::debug!(
                "mapping outcome for {}/{} in {}: {outcome:?}",
                self.content_type(),
                request.content_id,
                language.code,
            );

            outcomes.push(LanguageOutcome {
                language_id: language.id,
                outcome,
            });
        }

        outcomes
    }

    /// The update algorithm for a single language
    ///
    /// Derives the proposed mapping (autogenerated or typed), compares it to
    /// the previous one and applies the smallest registry change that makes
    /// the proposal current. A collision keeps the previous mapping active.
    async fn apply_language<R: Registry>(
        &self,
        registry: &R,
        normalizer: &SlugNormalizer,
        language: &Language,
        request: &SaveRequest,
        fields: &LanguageFields,
    ) -> MappingOutcome {
        let previous = fields.previous_uri.trim();

        let proposed = if request.autogenerate && normalizer.autogen_enabled() {
            match normalizer.normalize(&fields.title, Some(&language.code)) {
                Ok(slug) => match self.base_path(request.content_id, language) {
                    Some(prefix) => format!("{prefix}/{slug}"),
                    None => slug,
                },
                Err(failure) => return MappingOutcome::GenerationFailed(failure),
            }
        } else {
            slug::clean_uri(&fields.typed_uri)
        };

        if proposed == previous {
            return MappingOutcome::Unchanged;
        }

        let content = ContentRef::new(self.content_type(), request.content_id);

        if proposed.is_empty() {
            // consign the existing mapping to history, old links keep working
            return match registry.retire(previous, language.id).await {
                Ok(()) => MappingOutcome::RetiredOnly,
                Err(err) => MappingOutcome::StoreFailed(err.to_string()),
            };
        }

        let fragment = self.query_fragment(request.content_id);
        let values = InsertMappingValues {
            uri: &proposed,
            language_id: language.id,
            content,
            query_fragment: fragment.as_deref(),
        };

        let previous = (!previous.is_empty()).then_some(previous);

        match registry.replace(previous, &values).await {
            Ok(InsertOutcome::Inserted(mapping)) => {
                if previous.is_some() {
                    MappingOutcome::Updated { uri: mapping.uri }
                } else {
                    MappingOutcome::Inserted { uri: mapping.uri }
                }
            }
            Ok(InsertOutcome::Unchanged(_)) => MappingOutcome::Unchanged,
            Err(registry::Error::Collision { uri, .. }) => MappingOutcome::Collision { uri },
            Err(err) => MappingOutcome::StoreFailed(err.to_string()),
        }
    }

    /// Remove every mapping of a content item, active and historical
    ///
    /// Only when the content item itself is permanently deleted
    ///
    /// # Errors
    ///
    /// Store failures come back unchanged, the caller decides how to report
    /// them
    async fn on_delete<R: Registry>(&self, registry: &R, content_id: i32) -> registry::Result<u64> {
        registry
            .delete_all(ContentRef::new(self.content_type(), content_id))
            .await
    }

    /// Current active mapping per language, pre-populates edit forms
    ///
    /// # Errors
    ///
    /// Store failures come back unchanged
    async fn load_prior_state<R: Registry>(
        &self,
        registry: &R,
        content_id: i32,
    ) -> registry::Result<HashMap<LanguageId, String>> {
        let filter = MappingFilter {
            content_type: Some(self.content_type()),
            content_id: Some(content_id),
            status: Some(MappingStatus::Active),
            ..MappingFilter::default()
        };

        let mappings = registry.list(&filter).await?;

        Ok(mappings
            .into_iter()
            .map(|mapping| (mapping.language_id, mapping.uri))
            .collect())
    }
}
