//! Integration tests for the translation cache
//!
//! These tests drive the public API end to end with the in-memory store and
//! the echo provider. PostgreSQL-backed tests live in src/store/postgres.rs.

use proptest::prelude::*;
use std::sync::Arc;
use translation_cache::{
    catalog::LanguageCatalog,
    key::derive_key,
    language::NewLanguage,
    provider::EchoProvider,
    store::{MemoryStore, TranslationStore},
    translation::Approval,
    translator::{CreateTranslation, Limits, Translator},
    Error,
};

// ==================== Test Helpers ====================

/// Catalog seeded with English (default) and Spanish, plus a translator over the same store
async fn create_service() -> (LanguageCatalog, Translator, MemoryStore) {
    let store = MemoryStore::new();
    let catalog = LanguageCatalog::new(Arc::new(store.clone()));
    catalog.seed_defaults().await.expect("Failed to seed languages");
    let translator = Translator::new(
        Arc::new(store.clone()),
        Arc::new(EchoProvider),
        Limits::default(),
    );
    (catalog, translator, store)
}

// ==================== Key Derivation Tests ====================

#[test]
fn test_welcome_es_key_is_stable() {
    let first = derive_key("Welcome", "es").expect("Should derive");
    let second = derive_key("Welcome", "es").expect("Should derive");
    assert_eq!(first, second);
}

// ==================== Lookup-or-create Tests ====================

#[tokio::test]
async fn test_round_trip_miss_then_hit() {
    let (_catalog, translator, _store) = create_service().await;

    let miss = translator
        .translate("Good afternoon", "es", None, None)
        .await
        .expect("Should translate");
    assert!(!miss.from_cache);

    let hit = translator
        .translate("Good afternoon", "es", None, None)
        .await
        .expect("Should translate");
    assert!(hit.from_cache);
    assert_eq!(hit.translated_text, miss.translated_text);
}

#[tokio::test]
async fn test_unregistered_language_not_found() {
    let (_catalog, translator, _store) = create_service().await;
    let result = translator.translate("Hello", "xx", None, None).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_newly_registered_language_is_usable() {
    let (catalog, translator, _store) = create_service().await;
    catalog
        .create_language(NewLanguage::new("fr", "French", "Français"))
        .await
        .unwrap();

    let result = translator.translate("Hello", "fr", None, None).await.unwrap();
    assert_eq!(result.translated_text, "[fr] Hello");
}

#[tokio::test]
async fn test_length_and_batch_boundaries() {
    let (_catalog, translator, _store) = create_service().await;

    assert!(translator
        .translate(&"x".repeat(5000), "es", None, None)
        .await
        .is_ok());
    assert!(matches!(
        translator.translate(&"x".repeat(5001), "es", None, None).await,
        Err(Error::Validation(_))
    ));

    let hundred: Vec<String> = (0..100).map(|i| format!("Label {}", i)).collect();
    assert_eq!(
        translator
            .translate_batch(&hundred, "es", None, None)
            .await
            .unwrap()
            .len(),
        100
    );

    let too_many: Vec<String> = (0..101).map(|i| format!("Label {}", i)).collect();
    assert!(matches!(
        translator.translate_batch(&too_many, "es", None, None).await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn test_custom_limits_apply() {
    let store = MemoryStore::new();
    LanguageCatalog::new(Arc::new(store.clone()))
        .seed_defaults()
        .await
        .unwrap();
    let translator = Translator::new(
        Arc::new(store),
        Arc::new(EchoProvider),
        Limits {
            max_text_length: 10,
            max_batch_size: 2,
            delete_protection_threshold: 0,
        },
    );

    assert!(matches!(
        translator.translate("eleven chars", "es", None, None).await,
        Err(Error::Validation(_))
    ));
    let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    assert!(matches!(
        translator.translate_batch(&three, "es", None, None).await,
        Err(Error::Validation(_))
    ));
}

// ==================== Approval Workflow Tests ====================

#[tokio::test]
async fn test_review_flow() {
    let (_catalog, translator, _store) = create_service().await;

    translator.translate("Checkout", "es", None, None).await.unwrap();
    translator.translate("Cart", "es", None, None).await.unwrap();

    let pending = translator.pending_approvals().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].original_text, "Checkout");

    let approved = translator
        .approve(pending[0].id, "reviewer@example.com")
        .await
        .expect("Should approve");
    assert!(matches!(approved.approval, Approval::Approved { .. }));

    let second = translator.approve(pending[0].id, "reviewer@example.com").await;
    assert!(matches!(second, Err(Error::BusinessRuleViolation(_))));

    let remaining = translator.pending_approvals().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].original_text, "Cart");
}

#[tokio::test]
async fn test_duplicate_admin_create_conflicts_with_cached_entry() {
    let (_catalog, translator, _store) = create_service().await;
    translator.translate("Welcome", "es", None, None).await.unwrap();

    let result = translator
        .create_translation(CreateTranslation {
            text: "Welcome".to_string(),
            language_code: "es".to_string(),
            destination_text: "Bienvenido".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_delete_protection_scenario() {
    let (_catalog, translator, store) = create_service().await;

    let mut ids = Vec::new();
    for (text, uses) in [("Heavily used", 150), ("Lightly used", 50)] {
        let created = translator
            .create_translation(CreateTranslation {
                text: text.to_string(),
                language_code: "es".to_string(),
                destination_text: format!("{} (es)", text),
                approved_by: Some("admin".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        for _ in 0..uses {
            store.increment_usage(created.id).await.unwrap();
        }
        ids.push(created.id);
    }

    assert!(matches!(
        translator.delete_translation(ids[0]).await,
        Err(Error::BusinessRuleViolation(_))
    ));
    translator
        .delete_translation(ids[1])
        .await
        .expect("Should delete lightly used entry");
}

// ==================== Language Catalog Tests ====================

#[tokio::test]
async fn test_language_with_translations_cannot_be_deleted() {
    let (catalog, translator, _store) = create_service().await;
    translator.translate("Hello", "es", None, None).await.unwrap();

    assert!(matches!(
        catalog.delete_language("es").await,
        Err(Error::BusinessRuleViolation(_))
    ));
    assert!(matches!(
        catalog.delete_language("en").await,
        Err(Error::BusinessRuleViolation(_))
    ));
}

#[tokio::test]
async fn test_default_language_is_source_for_misses() {
    let (catalog, translator, _store) = create_service().await;
    catalog.set_default_language("es").await.unwrap();

    // Echo leaves text unchanged when source (now "es") equals target
    let result = translator.translate("Hola", "es", None, None).await.unwrap();
    assert_eq!(result.translated_text, "Hola");
}

// ==================== Property Tests ====================

proptest! {
    #[test]
    fn prop_whitespace_only_text_fails_validation(text in "[ \\t\\n]{0,20}") {
        let result = tokio_test::block_on(async {
            let (_catalog, translator, _store) = create_service().await;
            translator.translate(&text, "es", None, None).await
        });
        prop_assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn prop_second_call_is_cached(text in "[A-Za-z][A-Za-z ]{0,40}") {
        let (first, second) = tokio_test::block_on(async {
            let (_catalog, translator, _store) = create_service().await;
            let first = translator.translate(&text, "es", None, None).await.unwrap();
            let second = translator.translate(&text, "es", None, None).await.unwrap();
            (first, second)
        });
        prop_assert!(!first.from_cache);
        prop_assert!(second.from_cache);
        prop_assert_eq!(first.translated_text, second.translated_text);
    }
}
