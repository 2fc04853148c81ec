//! Integration tests for entity resolution.
//!
//! Tests cover:
//! - Category lookup by genre id, by name, and backfill of the genre id
//! - Director and actor reuse by TMDB id
//! - Placeholder director and fallback category

mod common;

use catalog_sync::core::resolver::{EntityResolver, FALLBACK_CATEGORY_NAME};
use catalog_sync::models::catalog::NewCategory;
use catalog_sync::models::remote::{PersonRef, RemoteGenre};
use catalog_sync::store::{CatalogStore, Repository};
use common::FakeCatalog;
use std::sync::Arc;

fn genre(id: u64, name: &str) -> RemoteGenre {
    RemoteGenre {
        id,
        name: name.to_string(),
    }
}

// ========== CATEGORIES ==========

#[tokio::test]
async fn test_category_created_once() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source, store.clone());

    let first = resolver.resolve_category(&genre(28, "Action")).await.unwrap();
    let second = resolver.resolve_category(&genre(28, "Action")).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.remote_id, Some(28));
    assert_eq!(store.list_categories().await.unwrap().len(), 1);
    assert_eq!(resolver.known_categories().await, vec![first]);
}

#[tokio::test]
async fn test_category_found_by_name_gets_genre_id() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    store
        .create_category(NewCategory {
            name: "Comedy".to_string(),
            remote_id: None,
            description: "Comedies".to_string(),
        })
        .await
        .unwrap();
    let resolver = EntityResolver::load(source, store.clone()).await.unwrap();

    let category = resolver.resolve_category(&genre(35, "Comedy")).await.unwrap();

    assert_eq!(category.remote_id, Some(35));
    let stored = store.find_category_by_remote_id(35).await.unwrap().unwrap();
    assert_eq!(stored.id, category.id);
    assert_eq!(store.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_category_found_by_name_keeps_other_genre_id() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    store
        .create_category(NewCategory::from_genre(10751, "Family"))
        .await
        .unwrap();
    let resolver = EntityResolver::new(source, store.clone());

    // Same name under another genre id resolves to the existing row untouched
    let category = resolver.resolve_category(&genre(99999, "Family")).await.unwrap();
    assert_eq!(category.remote_id, Some(10751));
    assert_eq!(store.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sync_genres() {
    let source = Arc::new(FakeCatalog::with_movies(0, 1));
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source, store.clone());

    let categories = resolver.sync_genres().await.unwrap();
    assert_eq!(categories.len(), 3);

    let again = resolver.sync_genres().await.unwrap();
    assert_eq!(again, categories);
    assert_eq!(store.list_categories().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_fallback_category() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source, store.clone());

    let fallback = resolver.fallback_category().await.unwrap();
    assert_eq!(fallback.name, FALLBACK_CATEGORY_NAME);
    assert_eq!(fallback.remote_id, None);

    // A second resolver over the same store reuses the row
    let other = EntityResolver::new(Arc::new(FakeCatalog::default()), store.clone());
    assert_eq!(other.fallback_category().await.unwrap().id, fallback.id);
    assert_eq!(store.list_categories().await.unwrap().len(), 1);
}

// ========== PEOPLE ==========

#[tokio::test]
async fn test_director_fetched_once() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source.clone(), store.clone());
    let person = PersonRef::new(525, "Christopher Nolan");

    let first = resolver.resolve_director(&person).await.unwrap();
    let second = resolver.resolve_director(&person).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.first_name, "Christopher");
    assert_eq!(first.last_name, "Nolan");
    assert_eq!(first.profile_path.as_deref(), Some("/p525.jpg"));
    assert_eq!(source.person_count(), 1);
}

#[tokio::test]
async fn test_placeholder_director_not_fetched() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source.clone(), store);

    let director = resolver
        .resolve_director(&PersonRef::placeholder_director())
        .await
        .unwrap();

    assert_eq!(director.remote_id, 0);
    assert_eq!(director.nationality, None);
    assert_eq!(source.person_count(), 0);
}

#[tokio::test]
async fn test_actor_fetched_once() {
    let source = Arc::new(FakeCatalog::default());
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source.clone(), store.clone());
    let person = PersonRef::new(6193, "Leonardo DiCaprio");

    let first = resolver.resolve_actor(&person).await.unwrap();
    let second = resolver.resolve_actor(&person).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.gender, 2);
    assert_eq!(
        first.birth_date,
        chrono::NaiveDate::from_ymd_opt(1970, 1, 31)
    );
    assert_eq!(source.person_count(), 1);
    assert_eq!(store.snapshot().await.actors.len(), 1);
}

#[tokio::test]
async fn test_actor_fetch_failure_creates_nothing() {
    let mut fake = FakeCatalog::default();
    fake.failing_persons.insert(77);
    let source = Arc::new(fake);
    let store = Arc::new(CatalogStore::in_memory());
    let resolver = EntityResolver::new(source, store.clone());

    let err = resolver
        .resolve_actor(&PersonRef::new(77, "Nobody Known"))
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert!(store.snapshot().await.actors.is_empty());
}
