//! Product mappings
//!
//! Products are nested under a category trail: the generated slug sits below
//! the category's own slug path, and the mapping's query fragment records the
//! trail (`cPath=1_5_7`) so the same product id stays resolvable to one
//! concrete placement.

use std::collections::HashMap;

use crate::languages::Language;
use crate::languages::LanguageId;
use crate::mappings::ContentType;
use crate::registry;
use crate::registry::Registry;
use crate::slug::SlugNormalizer;

use super::ContentTypeHandler;
use super::LanguageFields;
use super::LanguageOutcome;
use super::SaveRequest;

/// Handler for products filed under a category trail
#[derive(Clone, Debug)]
pub struct ProductHandler {
    /// Category ids from the root down to the product's parent
    category_path: Vec<i32>,

    /// Slugged category trail per language, prefixed to the product slug
    category_slugs: HashMap<LanguageId, String>,
}

impl ProductHandler {
    /// Create a product handler for one category placement
    ///
    /// `category_slugs` carries the already-normalized trail per language,
    /// e.g. `"kitchen/knives"`
    #[must_use]
    pub fn new(category_path: Vec<i32>, category_slugs: HashMap<LanguageId, String>) -> Self {
        Self {
            category_path,
            category_slugs,
        }
    }

    /// The category trail in `cPath` form
    fn trail(&self) -> String {
        let path: Vec<String> = self.category_path.iter().map(ToString::to_string).collect();

        format!("cPath={}", path.join("_"))
    }

    /// Re-home a product's mappings after a move to this handler's category
    ///
    /// Regenerates the mapping under the new trail for every language,
    /// retiring whatever was active under the old placement; the retired
    /// mappings keep resolving as history.
    ///
    /// # Errors
    ///
    /// Fails only when the prior state cannot be read; per-language
    /// regeneration failures land in the returned outcomes instead
    pub async fn on_move<R: Registry>(
        &self,
        registry: &R,
        normalizer: &SlugNormalizer,
        languages: &[Language],
        content_id: i32,
        titles: &HashMap<LanguageId, String>,
    ) -> registry::Result<Vec<LanguageOutcome>> {
        let prior = self.load_prior_state(registry, content_id).await?;

        let fields = languages
            .iter()
            .map(|language| {
                let fields = LanguageFields {
                    title: titles.get(&language.id).cloned().unwrap_or_default(),
                    typed_uri: String::new(),
                    previous_uri: prior.get(&language.id).cloned().unwrap_or_default(),
                };

                (language.id, fields)
            })
            .collect();

        let request = SaveRequest {
            content_id,
            fields,
            autogenerate: true,
        };

        Ok(self.on_save(registry, normalizer, languages, &request).await)
    }
}

impl ContentTypeHandler for ProductHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Product
    }

    fn query_fragment(&self, _content_id: i32) -> Option<String> {
        Some(self.trail())
    }

    fn base_path(&self, _content_id: i32, language: &Language) -> Option<String> {
        self.category_slugs
            .get(&language.id)
            .filter(|prefix| !prefix.is_empty())
            .cloned()
    }
}
