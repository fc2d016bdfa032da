//! In-memory collaborators for driving the services without Postgres, S3 or Kafka
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::Utc;
use recipe_cache::InMemoryCacheStore;
use recipe_service::db::{CommentRegistry, LikeRegistry, RecipeStore, SubscriptionStore, UserStore};
use recipe_service::kafka::NotificationPublisher;
use recipe_service::models::{
    Author, Comment, CommentId, Complexity, NewRecipe, OrderField, PhotoUpload, PhotoUrls, Recipe,
    RecipeCreatedEvent, RecipeDraft, RecipeId, RecipeQuery, SortDirection, Subscription, User,
    UserId,
};
use recipe_service::storage::FileStore;
use recipe_service::{Collaborators, Services};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ALICE_ID: UserId = 1;
pub const BOB_ID: UserId = 2;

#[derive(Default)]
pub struct FakeRecipeStore {
    recipes: Mutex<HashMap<RecipeId, Recipe>>,
    next_id: AtomicI64,
    pub writes: AtomicUsize,
    pub fail_writes: AtomicBool,
}

impl FakeRecipeStore {
    pub fn snapshot(&self, id: RecipeId) -> Option<Recipe> {
        self.recipes.lock().unwrap().get(&id).cloned()
    }

    /// Change a stored row behind the services' back
    pub fn overwrite_title(&self, id: RecipeId, title: &str) {
        if let Some(recipe) = self.recipes.lock().unwrap().get_mut(&id) {
            recipe.title = title.to_string();
        }
    }

    pub fn len(&self) -> usize {
        self.recipes.lock().unwrap().len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("recipe store unavailable"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn matches_text(recipe: &Recipe, text: &str) -> bool {
    let text = text.to_lowercase();
    [&recipe.title, &recipe.about, &recipe.ingredients]
        .iter()
        .any(|field| field.to_lowercase().contains(&text))
}

#[async_trait::async_trait]
impl RecipeStore for FakeRecipeStore {
    async fn get_all(&self) -> Result<Vec<Recipe>> {
        let mut recipes: Vec<Recipe> = self.recipes.lock().unwrap().values().cloned().collect();
        recipes.sort_by_key(|r| r.id);
        Ok(recipes)
    }

    async fn get_filtered(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
        let mut recipes: Vec<Recipe> = self
            .recipes
            .lock()
            .unwrap()
            .values()
            .filter(|r| query.text.is_empty() || matches_text(r, &query.text))
            .cloned()
            .collect();

        recipes.sort_by(|a, b| match query.order {
            OrderField::Title => a.title.cmp(&b.title),
            OrderField::Complexity => i16::from(a.complexity).cmp(&i16::from(b.complexity)),
            OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        });
        if query.direction == Some(SortDirection::Desc) {
            recipes.reverse();
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(recipes.into_iter().skip(offset).take(limit).collect())
    }

    async fn get(&self, id: RecipeId) -> Result<Option<Recipe>> {
        Ok(self.snapshot(id))
    }

    async fn create(&self, draft: &RecipeDraft) -> Result<RecipeId> {
        self.check_writable()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let fields = &draft.fields;
        let recipe = Recipe {
            id,
            owner_id: draft.owner_id,
            title: fields.title.clone(),
            about: fields.about.clone(),
            complexity: fields.complexity,
            need_time: fields.need_time.clone(),
            ingredients: fields.ingredients.clone(),
            instructions: fields.instructions.clone(),
            photo_urls: draft.photo_urls.clone(),
            created_at: now,
            updated_at: now,
        };
        self.recipes.lock().unwrap().insert(id, recipe);
        Ok(id)
    }

    async fn update(&self, recipe: &Recipe) -> Result<()> {
        self.check_writable()?;
        let mut stored = recipe.clone();
        stored.updated_at = Utc::now();
        self.recipes.lock().unwrap().insert(recipe.id, stored);
        Ok(())
    }

    async fn delete(&self, id: RecipeId) -> Result<()> {
        self.check_writable()?;
        self.recipes.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeUserStore {
    users: Mutex<HashMap<UserId, User>>,
    pub author_lookups: AtomicUsize,
}

impl FakeUserStore {
    pub fn add(&self, id: UserId, login: &str) {
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                login: login.to_string(),
                email: format!("{}@example.com", login),
                icon_url: format!("http://files.local/icons/{}", login),
                about: String::new(),
                created_at: Utc::now(),
            },
        );
    }

    pub fn rename(&self, id: UserId, login: &str) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.login = login.to_string();
        }
    }
}

#[async_trait::async_trait]
impl UserStore for FakeUserStore {
    async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.login == login)
            .cloned())
    }

    async fn get_author(&self, id: UserId) -> Result<Option<Author>> {
        self.author_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(&id).map(Author::from))
    }
}

pub struct FakeLikeRegistry {
    likes: Mutex<HashSet<(UserId, RecipeId)>>,
    recipes: Arc<FakeRecipeStore>,
    /// Makes `is_liked` answer false, as if a concurrent request had not landed yet
    pub stale_reads: AtomicBool,
}

impl FakeLikeRegistry {
    pub fn new(recipes: Arc<FakeRecipeStore>) -> Self {
        Self {
            likes: Mutex::new(HashSet::new()),
            recipes,
            stale_reads: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl LikeRegistry for FakeLikeRegistry {
    async fn is_liked(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        if self.stale_reads.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.likes.lock().unwrap().contains(&(user_id, recipe_id)))
    }

    async fn likes_count(&self, recipe_id: RecipeId) -> Result<i64> {
        Ok(self
            .likes
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| *r == recipe_id)
            .count() as i64)
    }

    async fn like(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        Ok(self.likes.lock().unwrap().insert((user_id, recipe_id)))
    }

    async fn unlike(&self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        Ok(self.likes.lock().unwrap().remove(&(user_id, recipe_id)))
    }

    async fn liked_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>> {
        let ids: Vec<RecipeId> = self
            .likes
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.recipes.snapshot(id))
            .collect())
    }
}

#[derive(Default)]
pub struct FakeCommentRegistry {
    comments: Mutex<Vec<Comment>>,
    next_id: AtomicI64,
}

#[async_trait::async_trait]
impl CommentRegistry for FakeCommentRegistry {
    async fn list(&self, recipe_id: RecipeId) -> Result<Vec<Comment>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.recipe_id == recipe_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn create(&self, user_id: UserId, recipe_id: RecipeId, text: &str) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            recipe_id,
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn update_text(&self, id: CommentId, text: &str) -> Result<()> {
        if let Some(comment) = self.comments.lock().unwrap().iter_mut().find(|c| c.id == id) {
            comment.text = text.to_string();
            comment.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: CommentId) -> Result<()> {
        self.comments.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSubscriptionStore {
    subscriptions: Mutex<BTreeSet<(UserId, UserId)>>,
}

#[async_trait::async_trait]
impl SubscriptionStore for FakeSubscriptionStore {
    async fn exists(&self, s: Subscription) -> Result<bool> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .contains(&(s.creator_id, s.subscriber_id)))
    }

    async fn insert(&self, s: Subscription) -> Result<bool> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .insert((s.creator_id, s.subscriber_id)))
    }

    async fn delete(&self, s: Subscription) -> Result<bool> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .remove(&(s.creator_id, s.subscriber_id)))
    }

    async fn subscribers(&self, creator_id: UserId) -> Result<Vec<UserId>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == creator_id)
            .map(|(_, s)| *s)
            .collect())
    }
}

#[derive(Default)]
pub struct FakeFileStore {
    objects: Mutex<HashSet<String>>,
    counter: AtomicUsize,
    pub fail_remove: AtomicBool,
}

impl FakeFileStore {
    pub fn stored(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.objects.lock().unwrap().contains(url)
    }

    pub fn contains_all(&self, urls: &PhotoUrls) -> bool {
        urls.iter().all(|url| self.contains(url))
    }
}

#[async_trait::async_trait]
impl FileStore for FakeFileStore {
    async fn save(&self, files: Vec<Vec<u8>>, _content_type: &str) -> Result<PhotoUrls> {
        let mut objects = self.objects.lock().unwrap();
        let urls = files
            .iter()
            .map(|_| {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                let url = format!("http://files.local/photos/{}", n);
                objects.insert(url.clone());
                url
            })
            .collect();
        Ok(PhotoUrls::new(urls))
    }

    async fn remove(&self, urls: &PhotoUrls) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(anyhow!("object storage unavailable"));
        }
        let mut objects = self.objects.lock().unwrap();
        for url in urls.iter() {
            objects.remove(url);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<RecipeCreatedEvent>>,
    pub fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<RecipeCreatedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn send(&self, event: &RecipeCreatedEvent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("broker unreachable"));
        }
        self.events.lock().unwrap().push(*event);
        Ok(())
    }
}

/// Every collaborator as an in-memory fake, with alice (1) and bob (2) registered
pub struct TestEnv {
    pub cache: Arc<InMemoryCacheStore>,
    pub recipes: Arc<FakeRecipeStore>,
    pub users: Arc<FakeUserStore>,
    pub likes: Arc<FakeLikeRegistry>,
    pub comments: Arc<FakeCommentRegistry>,
    pub subscriptions: Arc<FakeSubscriptionStore>,
    pub files: Arc<FakeFileStore>,
    pub publisher: Arc<RecordingPublisher>,
}

impl TestEnv {
    pub fn new() -> Self {
        let recipes = Arc::new(FakeRecipeStore::default());
        let users = Arc::new(FakeUserStore::default());
        users.add(ALICE_ID, "alice");
        users.add(BOB_ID, "bob");

        Self {
            cache: Arc::new(InMemoryCacheStore::new()),
            likes: Arc::new(FakeLikeRegistry::new(recipes.clone())),
            recipes,
            users,
            comments: Arc::new(FakeCommentRegistry::default()),
            subscriptions: Arc::new(FakeSubscriptionStore::default()),
            files: Arc::new(FakeFileStore::default()),
            publisher: Arc::new(RecordingPublisher::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            cache: self.cache.clone(),
            recipes: self.recipes.clone(),
            users: self.users.clone(),
            likes: self.likes.clone(),
            comments: self.comments.clone(),
            subscriptions: self.subscriptions.clone(),
            files: self.files.clone(),
            publisher: self.publisher.clone(),
        }
    }

    pub fn services(&self) -> Services {
        Services::new(&self.collaborators())
    }
}

pub fn new_recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        about: "Family recipe".to_string(),
        complexity: Complexity::Medium,
        need_time: "45 min".to_string(),
        ingredients: "water, salt".to_string(),
        instructions: "Boil and serve".to_string(),
    }
}

pub fn photos(count: usize) -> PhotoUpload {
    PhotoUpload::new(
        (0..count).map(|i| vec![0xFF, 0xD8, i as u8]).collect(),
        "image/jpeg",
    )
}

/// Create a recipe owned by alice through the service
pub async fn create_as_alice(services: &Services, title: &str) -> RecipeId {
    services
        .recipes
        .create("alice", ALICE_ID, new_recipe(title), photos(1))
        .await
        .expect("create recipe")
}
