/// Business logic layer
///
/// Services are built once from a set of collaborators and shared behind
/// `Arc`. Every request-scoped value (acting login, requestor id) is passed
/// explicitly into each call.
use recipe_cache::CacheStore;
use std::sync::Arc;

use crate::db::{CommentRegistry, LikeRegistry, RecipeStore, SubscriptionStore, UserStore};
use crate::kafka::NotificationPublisher;
use crate::storage::FileStore;

pub mod authors;
pub mod comments;
pub mod likes;
pub mod recipes;
pub mod subscriptions;

pub use authors::AuthorResolver;
pub use comments::CommentService;
pub use likes::LikeService;
pub use recipes::RecipeAggregateService;
pub use subscriptions::SubscriptionService;

/// External capabilities the services are wired against
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn CacheStore>,
    pub recipes: Arc<dyn RecipeStore>,
    pub users: Arc<dyn UserStore>,
    pub likes: Arc<dyn LikeRegistry>,
    pub comments: Arc<dyn CommentRegistry>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub files: Arc<dyn FileStore>,
    pub publisher: Arc<dyn NotificationPublisher>,
}

/// Fully wired service set
#[derive(Clone)]
pub struct Services {
    pub authors: Arc<AuthorResolver>,
    pub recipes: Arc<RecipeAggregateService>,
    pub likes: Arc<LikeService>,
    pub comments: Arc<CommentService>,
    pub subscriptions: Arc<SubscriptionService>,
}

impl Services {
    pub fn new(deps: &Collaborators) -> Self {
        let authors = Arc::new(AuthorResolver::new(deps.cache.clone(), deps.users.clone()));
        let subscriptions = Arc::new(SubscriptionService::new(
            deps.users.clone(),
            deps.subscriptions.clone(),
            deps.publisher.clone(),
        ));
        let comments = Arc::new(CommentService::new(
            deps.recipes.clone(),
            deps.comments.clone(),
            authors.clone(),
        ));
        let likes = Arc::new(LikeService::new(deps.recipes.clone(), deps.likes.clone()));
        let recipes = Arc::new(RecipeAggregateService::new(
            deps,
            authors.clone(),
            subscriptions.clone(),
        ));

        Self {
            authors,
            recipes,
            likes,
            comments,
            subscriptions,
        }
    }
}
