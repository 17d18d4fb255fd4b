use crate::handlers::ContentTypeHandler;
use crate::handlers::PageHandler;
use crate::registry::Registry;

use crate::tests::helper;

#[tokio::test]
async fn test_prior_state_lists_active_uris_per_language() {
    let (registry, normalizer) = helper::setup();
    let languages = helper::languages();
    let handler = PageHandler::new();

    let request = helper::autogen_request(12, "Gift Vouchers", &languages);
    handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    let prior = handler.load_prior_state(&registry, 12).await.unwrap();

    assert_eq!(2, prior.len());
    assert_eq!(Some(&"gift-vouchers".to_string()), prior.get(&helper::ENGLISH));
    assert_eq!(Some(&"gift-vouchers".to_string()), prior.get(&helper::GERMAN));
}

#[tokio::test]
async fn test_prior_state_skips_retired_mappings() {
    let (registry, normalizer) = helper::setup();
    let languages = helper::languages();
    let handler = PageHandler::new();

    let request = helper::autogen_request(12, "Gift Vouchers", &languages);
    handler
        .on_save(&registry, &normalizer, &languages, &request)
        .await;

    registry.retire("gift-vouchers", helper::GERMAN).await.unwrap();

    let prior = handler.load_prior_state(&registry, 12).await.unwrap();

    assert_eq!(1, prior.len());
    assert!(prior.contains_key(&helper::ENGLISH));
}

#[tokio::test]
async fn test_prior_state_of_unknown_item_is_empty() {
    let (registry, _) = helper::setup();
    let handler = PageHandler::new();

    let prior = handler.load_prior_state(&registry, 404).await.unwrap();

    assert!(prior.is_empty());
}
