/// Data models for recipe-service
///
/// Recipes are the only entity cached as a whole. Authors are a cached
/// projection of users; likes, comments and counts are always read fresh.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::ServiceError;

pub type RecipeId = i64;
pub type UserId = i64;
pub type CommentId = i64;

/// Separator used when photo URLs are persisted as a single string
pub const PHOTO_URL_SEPARATOR: char = ';';

/// Ordered list of photo URLs.
///
/// Persisted as a `;`-joined string. Parsing drops empty segments, so both
/// `a;b` and the legacy `a;b;` form yield `[a, b]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoUrls(Vec<String>);

impl PhotoUrls {
    pub fn new(urls: Vec<String>) -> Self {
        Self(urls.into_iter().filter(|u| !u.is_empty()).collect())
    }

    pub fn parse(joined: &str) -> Self {
        Self(
            joined
                .split(PHOTO_URL_SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn join(&self) -> String {
        self.0.join(&PHOTO_URL_SEPARATOR.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Recipe complexity, persisted as 1..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum Complexity {
    Easy = 1,
    Medium = 2,
    Hard = 3,
}

impl TryFrom<i16> for Complexity {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Complexity::Easy),
            2 => Ok(Complexity::Medium),
            3 => Ok(Complexity::Hard),
            other => Err(format!("complexity must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Complexity> for i16 {
    fn from(value: Complexity) -> Self {
        value as i16
    }
}

/// Recipe entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub owner_id: UserId,
    pub title: String,
    pub about: String,
    pub complexity: Complexity,
    pub need_time: String,
    pub ingredients: String,
    pub instructions: String,
    pub photo_urls: PhotoUrls,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a recipe
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRecipe {
    #[validate(length(min = 3, max = 50))]
    pub title: String,
    #[validate(length(max = 2500))]
    pub about: String,
    pub complexity: Complexity,
    #[validate(length(min = 1))]
    pub need_time: String,
    #[validate(length(max = 1500))]
    pub ingredients: String,
    pub instructions: String,
}

/// Recipe row ready to be inserted
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub owner_id: UserId,
    pub fields: NewRecipe,
    pub photo_urls: PhotoUrls,
}

/// Photo files attached to a create or update request
#[derive(Debug, Clone, Default)]
pub struct PhotoUpload {
    pub files: Vec<Vec<u8>>,
    pub content_type: String,
}

impl PhotoUpload {
    pub fn new(files: Vec<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            files,
            content_type: content_type.into(),
        }
    }

    /// No photos attached
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Partial update of a recipe.
///
/// `None` leaves the stored value untouched; `Some` replaces it, including
/// with an empty string where validation allows one.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RecipeChanges {
    #[validate(length(min = 3, max = 50))]
    pub title: Option<String>,
    #[validate(length(max = 2500))]
    pub about: Option<String>,
    pub complexity: Option<Complexity>,
    #[validate(length(min = 1))]
    pub need_time: Option<String>,
    #[validate(length(max = 1500))]
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
}

impl RecipeChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.about.is_none()
            && self.complexity.is_none()
            && self.need_time.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
    }

    pub fn apply_to(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(about) = &self.about {
            recipe.about = about.clone();
        }
        if let Some(complexity) = self.complexity {
            recipe.complexity = complexity;
        }
        if let Some(need_time) = &self.need_time {
            recipe.need_time = need_time.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            recipe.ingredients = ingredients.clone();
        }
        if let Some(instructions) = &self.instructions {
            recipe.instructions = instructions.clone();
        }
    }
}

/// Column a recipe listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    Complexity,
    UpdatedAt,
}

impl OrderField {
    /// Empty input falls back to title ordering. `complexitiy` is accepted
    /// for older clients.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "title" => Some(OrderField::Title),
            "complexity" | "complexitiy" => Some(OrderField::Complexity),
            "updated_at" => Some(OrderField::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            OrderField::Title => "title",
            OrderField::Complexity => "complexity",
            OrderField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Search and ordering parameters as received from the caller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecipeFilter {
    pub query: String,
    pub order_field: String,
    /// -1 descending, 1 ascending, 0 store default
    pub order_by: i8,
    /// 0 means no limit
    pub limit: i64,
    /// 0 means no offset
    pub offset: i64,
}

impl RecipeFilter {
    pub fn into_query(self) -> Result<RecipeQuery, ServiceError> {
        let order = OrderField::parse(&self.order_field)
            .ok_or_else(|| ServiceError::BadOrderField(self.order_field.clone()))?;

        let direction = match self.order_by {
            -1 => Some(SortDirection::Desc),
            0 => None,
            1 => Some(SortDirection::Asc),
            other => {
                return Err(ServiceError::Validation(format!(
                    "order_by must be -1, 0 or 1, got {}",
                    other
                )))
            }
        };

        if self.limit < 0 || self.offset < 0 {
            return Err(ServiceError::Validation(
                "limit and offset must not be negative".to_string(),
            ));
        }

        Ok(RecipeQuery {
            text: self.query,
            order,
            direction,
            limit: (self.limit > 0).then_some(self.limit),
            offset: (self.offset > 0).then_some(self.offset),
        })
    }
}

/// Validated recipe search handed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub text: String,
    pub order: OrderField,
    pub direction: Option<SortDirection>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// User account as seen by this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub email: String,
    pub icon_url: String,
    pub about: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user attached to recipes and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub login: String,
    pub icon_url: String,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Author {
            login: user.login.clone(),
            icon_url: user.icon_url.clone(),
        }
    }
}

/// Recipe listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeWithAuthor {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub author: Author,
}

/// Comment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub recipe_id: RecipeId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment text as submitted by a user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentText {
    #[validate(length(min = 1, max = 250))]
    pub text: String,
}

/// Comment with its author resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub id: CommentId,
    pub author: Author,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read aggregate for a single recipe. Request scoped, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullRecipe {
    pub recipe: Recipe,
    pub author: Author,
    pub likes_count: i64,
    pub is_liked: bool,
    pub comments: Vec<CommentView>,
}

/// Creator/subscriber pair, unique per pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub creator_id: UserId,
    pub subscriber_id: UserId,
}

/// One-shot message announcing a new recipe to the subscriber fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCreatedEvent {
    #[serde(rename = "CreatorID")]
    pub creator_id: UserId,
    #[serde(rename = "RecipeID")]
    pub recipe_id: RecipeId,
}

impl fmt::Display for RecipeCreatedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recipe {} by creator {}", self.recipe_id, self.creator_id)
    }
}
