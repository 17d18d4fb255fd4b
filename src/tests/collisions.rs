use std::collections::HashMap;

use crate::handlers::ContentTypeHandler;
use crate::handlers::MappingOutcome;
use crate::handlers::PageHandler;
use crate::mappings::ContentRef;
use crate::mappings::ContentType;
use crate::mappings::MappingStatus;
use crate::registry::InsertMappingValues;
use crate::registry::InsertOutcome;
use crate::registry::MappingFilter;
use crate::registry::Registry;

use crate::tests::helper;

#[tokio::test]
async fn test_collision_keeps_previous_mapping_active() {
    let (registry, normalizer) = helper::setup();
    let languages = helper::english_only();
    let handler = PageHandler::new();

    // item 9 already holds the contested uri
    let request = helper::autogen_request(9, "Blue Widget", &languages);
    handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    // item 7 currently has another mapping
    let request = helper::autogen_request(7, "Older Widget", &languages);
    handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    // renaming item 7 onto the contested uri collides
    let previous = HashMap::from([(helper::ENGLISH, "older-widget".to_string())]);
    let request = helper::autogen_request_with_previous(7, "Blue Widget", &languages, &previous);
    let outcomes = handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    assert_eq!(
        &MappingOutcome::Collision {
            uri: "blue-widget".to_string()
        },
        helper::outcome_for(&outcomes, helper::ENGLISH),
    );

    // item 7's previous mapping was not retired by the failed rename
    let active = registry
        .find_active(ContentRef::new(ContentType::Page, 7), helper::ENGLISH)
        .await
        .unwrap()
        .expect("previous mapping still active");
    assert_eq!("older-widget", active.uri);

    // and the contested uri still belongs to item 9
    let holder = registry
        .find_by_uri("blue-widget", helper::ENGLISH)
        .await
        .unwrap()
        .expect("a holder");
    assert_eq!(9, holder.content_id);
    assert!(holder.is_active());
}

#[tokio::test]
async fn test_resubmitting_current_mapping_is_a_noop() {
    let (registry, normalizer) = helper::setup();
    let languages = helper::english_only();
    let handler = PageHandler::new();

    let request = helper::autogen_request(3, "Contact Us", &languages);
    handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    // identical save, previous mapping known
    let previous = HashMap::from([(helper::ENGLISH, "contact-us".to_string())]);
    let request = helper::autogen_request_with_previous(3, "Contact Us", &languages, &previous);
    let outcomes = handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    assert_eq!(
        &MappingOutcome::Unchanged,
        helper::outcome_for(&outcomes, helper::ENGLISH),
    );

    // no history record appeared
    let records = registry
        .list(&MappingFilter::for_content(ContentRef::new(
            ContentType::Page,
            3,
        )))
        .await
        .unwrap();
    assert_eq!(1, records.len());
    assert_eq!(MappingStatus::Active, records[0].status);
}

#[tokio::test]
async fn test_direct_reinsert_by_owner_is_a_noop() {
    let (registry, _) = helper::setup();

    let values = InsertMappingValues {
        uri: "terms",
        language_id: helper::ENGLISH,
        content: ContentRef::new(ContentType::Page, 1),
        query_fragment: None,
    };

    assert!(matches!(
        registry.insert(&values).await.unwrap(),
        InsertOutcome::Inserted(_)
    ));

    // same owner, same uri: success without a new record
    assert!(matches!(
        registry.insert(&values).await.unwrap(),
        InsertOutcome::Unchanged(_)
    ));

    let records = registry.list(&MappingFilter::default()).await.unwrap();
    assert_eq!(1, records.len());
}

#[tokio::test]
async fn test_at_most_one_active_mapping_per_item_and_language() {
    let (registry, normalizer) = helper::setup();
    let languages = helper::languages();
    let handler = PageHandler::new();

    // a chain of renames builds history but never a second active record
    let mut previous = HashMap::new();

    for title in ["First Name", "Second Name", "Third Name"] {
        let request = helper::autogen_request_with_previous(6, title, &languages, &previous);
        let outcomes = handler
            .on_save(&registry, &normalizer, &languages, &request)
            .await;

        previous = outcomes
            .iter()
            .filter_map(|outcome| match &outcome.outcome {
                MappingOutcome::Inserted { uri } | MappingOutcome::Updated { uri } => {
                    Some((outcome.language_id, uri.clone()))
                }
                _ => None,
            })
            .collect();
    }

    for language in &languages {
        let active = registry
            .list(&MappingFilter {
                content_type: Some(ContentType::Page),
                content_id: Some(6),
                language_id: Some(language.id),
                status: Some(MappingStatus::Active),
            })
            .await
            .unwrap();

        assert_eq!(1, active.len(), "language {}", language.code);
    }

    // the two superseded names per language are all historical
    let historical = registry
        .list(&MappingFilter {
            content_type: Some(ContentType::Page),
            content_id: Some(6),
            language_id: None,
            status: Some(MappingStatus::Historical),
        })
        .await
        .unwrap();
    assert_eq!(4, historical.len());
}
