use std::collections::HashMap;

use crate::config::Config;
use crate::handlers::LanguageFields;
use crate::handlers::LanguageOutcome;
use crate::handlers::MappingOutcome;
use crate::handlers::SaveRequest;
use crate::languages::Language;
use crate::languages::LanguageId;
use crate::registry::Memory;
use crate::slug::SlugNormalizer;

pub const ENGLISH: LanguageId = 1;
pub const GERMAN: LanguageId = 2;

/// The storefront languages most tests run with
pub fn languages() -> Vec<Language> {
    vec![
        Language::new(ENGLISH, "en", "English"),
        Language::new(GERMAN, "de", "Deutsch"),
    ]
}

pub fn english_only() -> Vec<Language> {
    vec![Language::new(ENGLISH, "en", "English")]
}

/// Fresh registry and normalizer with default configuration
///
/// Log output is opt-in, `RUST_LOG=urimap=debug cargo test`
pub fn setup() -> (Memory, SlugNormalizer) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    (Memory::new(), SlugNormalizer::new(&Config::default()))
}

/// Save request autogenerating from the same title in every language
pub fn autogen_request(content_id: i32, title: &str, languages: &[Language]) -> SaveRequest {
    autogen_request_with_previous(content_id, title, languages, &HashMap::new())
}

/// Save request autogenerating from one title, with known previous mappings
pub fn autogen_request_with_previous(
    content_id: i32,
    title: &str,
    languages: &[Language],
    previous: &HashMap<LanguageId, String>,
) -> SaveRequest {
    let fields = languages
        .iter()
        .map(|language| {
            let fields = LanguageFields {
                title: title.to_string(),
                typed_uri: String::new(),
                previous_uri: previous.get(&language.id).cloned().unwrap_or_default(),
            };

            (language.id, fields)
        })
        .collect();

    SaveRequest {
        content_id,
        fields,
        autogenerate: true,
    }
}

/// Save request with a hand-typed mapping for a single language
pub fn typed_request(
    content_id: i32,
    language_id: LanguageId,
    typed_uri: &str,
    previous_uri: &str,
) -> SaveRequest {
    let fields = LanguageFields {
        title: String::new(),
        typed_uri: typed_uri.to_string(),
        previous_uri: previous_uri.to_string(),
    };

    SaveRequest {
        content_id,
        fields: HashMap::from([(language_id, fields)]),
        autogenerate: false,
    }
}

/// The outcome reported for one language
pub fn outcome_for(outcomes: &[LanguageOutcome], language_id: LanguageId) -> &MappingOutcome {
    &outcomes
        .iter()
        .find(|outcome| outcome.language_id == language_id)
        .expect("an outcome per language")
        .outcome
}
