mod common;

use common::*;
use mockall::mock;
use mockall::predicate::*;
use recipe_cache::{CacheError, CacheResult, CacheStore};
use recipe_service::kafka::NotificationPublisher;
use recipe_service::models::{PhotoUpload, PhotoUrls, RecipeChanges, RecipeCreatedEvent};
use recipe_service::storage::FileStore;
use recipe_service::ServiceError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Cache {}

    #[async_trait::async_trait]
    impl CacheStore for Cache {
        async fn get(&self, key: &str) -> CacheResult<String>;
        async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;
        async fn del(&self, key: &str) -> CacheResult<u64>;
    }
}

mock! {
    pub Files {}

    #[async_trait::async_trait]
    impl FileStore for Files {
        async fn save(&self, files: Vec<Vec<u8>>, content_type: &str) -> anyhow::Result<PhotoUrls>;
        async fn remove(&self, urls: &PhotoUrls) -> anyhow::Result<()>;
    }
}

mock! {
    pub Publisher {}

    #[async_trait::async_trait]
    impl NotificationPublisher for Publisher {
        async fn send(&self, event: &RecipeCreatedEvent) -> anyhow::Result<()>;
    }
}

/// A cache failure that is not a miss
fn broken_cache_error() -> CacheError {
    CacheError::Serialization(serde_json::from_str::<i64>("not a number").unwrap_err())
}

#[tokio::test]
async fn cache_outage_on_read_is_fatal() {
    let env = TestEnv::new();
    let id = create_as_alice(&env.services(), "Soup").await;

    let mut cache = MockCache::new();
    cache
        .expect_get()
        .returning(|_| Err(broken_cache_error()));
    cache.expect_set().never();

    let mut deps = env.collaborators();
    deps.cache = Arc::new(cache);
    let services = recipe_service::Services::new(&deps);

    let err = services.recipes.get(id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Cache(_)));
}

#[tokio::test]
async fn cache_write_failure_on_read_is_ignored() {
    let env = TestEnv::new();
    let id = create_as_alice(&env.services(), "Soup").await;

    let mut cache = MockCache::new();
    cache.expect_get().returning(|_| Err(CacheError::NotFound));
    cache
        .expect_set()
        .withf(|_, _, ttl| *ttl == Duration::from_secs(300))
        .returning(|_, _, _| Err(broken_cache_error()));

    let mut deps = env.collaborators();
    deps.cache = Arc::new(cache);
    let services = recipe_service::Services::new(&deps);

    let full = services.recipes.get(id, None).await.unwrap();
    assert_eq!(full.recipe.title, "Soup");
    assert_eq!(full.author.login, "alice");
}

#[tokio::test]
async fn invalidation_failure_is_reported_after_persist() {
    let env = TestEnv::new();
    let id = create_as_alice(&env.services(), "Soup").await;

    let mut cache = MockCache::new();
    cache.expect_get().returning(|_| Err(CacheError::NotFound));
    cache.expect_set().never();
    cache
        .expect_del()
        .with(eq(format!("recipe:{}", id)))
        .times(1)
        .returning(|_| Err(broken_cache_error()));

    let mut deps = env.collaborators();
    deps.cache = Arc::new(cache);
    let services = recipe_service::Services::new(&deps);

    let changes = RecipeChanges {
        title: Some("Stew".to_string()),
        ..Default::default()
    };
    let err = services
        .recipes
        .update("alice", ALICE_ID, id, changes, PhotoUpload::none())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Cache(_)));
    assert_eq!(env.recipes.snapshot(id).unwrap().title, "Stew");
}

#[tokio::test]
async fn old_photos_survive_failed_invalidation() {
    let env = TestEnv::new();
    let id = create_as_alice(&env.services(), "Soup").await;
    let old = env.recipes.snapshot(id).unwrap().photo_urls;

    let mut cache = MockCache::new();
    cache.expect_get().returning(|_| Err(CacheError::NotFound));
    cache.expect_del().returning(|_| Err(broken_cache_error()));

    let mut deps = env.collaborators();
    deps.cache = Arc::new(cache);
    let services = recipe_service::Services::new(&deps);

    services
        .recipes
        .update("alice", ALICE_ID, id, RecipeChanges::default(), photos(1))
        .await
        .unwrap_err();

    assert!(env.files.contains_all(&old));
}

#[tokio::test]
async fn publisher_receives_creator_and_recipe() {
    let env = TestEnv::new();

    let mut publisher = MockPublisher::new();
    publisher
        .expect_send()
        .withf(|event| event.creator_id == ALICE_ID && event.recipe_id == 1)
        .times(1)
        .returning(|_| Ok(()));

    let mut deps = env.collaborators();
    deps.publisher = Arc::new(publisher);
    let services = recipe_service::Services::new(&deps);

    let id = create_as_alice(&services, "Soup").await;
    assert_eq!(id, 1);
}

#[tokio::test]
async fn publisher_failure_surfaces_after_persist() {
    let env = TestEnv::new();

    let mut publisher = MockPublisher::new();
    publisher
        .expect_send()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("broker down")));

    let mut deps = env.collaborators();
    deps.publisher = Arc::new(publisher);
    let services = recipe_service::Services::new(&deps);

    let err = services
        .recipes
        .create("alice", ALICE_ID, new_recipe("Soup"), photos(1))
        .await
        .unwrap_err();

    assert_eq!(err.created_recipe_id(), Some(1));
    assert_eq!(env.recipes.len(), 1);
}

#[tokio::test]
async fn upload_failure_stops_create_before_store() {
    let env = TestEnv::new();

    let mut files = MockFiles::new();
    files
        .expect_save()
        .times(1)
        .returning(|_, _| Err(anyhow::anyhow!("bucket missing")));
    files.expect_remove().never();

    let mut deps = env.collaborators();
    deps.files = Arc::new(files);
    let services = recipe_service::Services::new(&deps);

    let err = services
        .recipes
        .create("alice", ALICE_ID, new_recipe("Soup"), photos(2))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Internal(_)));
    assert_eq!(env.recipes.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn compensation_removes_exactly_the_new_upload() {
    let env = TestEnv::new();
    env.recipes.fail_writes.store(true, Ordering::SeqCst);

    let uploaded = PhotoUrls::parse("http://files.local/photos/a;http://files.local/photos/b");
    let expected = uploaded.clone();

    let mut files = MockFiles::new();
    files
        .expect_save()
        .times(1)
        .returning(move |_, _| Ok(uploaded.clone()));
    files
        .expect_remove()
        .withf(move |urls| *urls == expected)
        .times(1)
        .returning(|_| Ok(()));

    let mut deps = env.collaborators();
    deps.files = Arc::new(files);
    let services = recipe_service::Services::new(&deps);

    let err = services
        .recipes
        .create("alice", ALICE_ID, new_recipe("Soup"), photos(2))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Internal(_)));
}
