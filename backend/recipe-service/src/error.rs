/// Error types for recipe-service
///
/// Domain failures are distinct variants so callers can match on them.
/// Collaborator failures arrive as `anyhow::Error` from the store traits and
/// land in `Internal`; cache failures keep their own variant.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use recipe_cache::CacheError;
use thiserror::Error;

use crate::models::{CommentId, RecipeId};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("recipe {0} not found")]
    RecipeNotFound(RecipeId),

    #[error("user not found")]
    UserNotFound,

    #[error("comment {0} not found")]
    CommentNotFound(CommentId),

    #[error("user has no permission for this action")]
    PermissionDenied,

    #[error("recipe must have at least one photo")]
    EmptyPhotos,

    #[error("bad order field: {0}")]
    BadOrderField(String),

    #[error("recipe already liked")]
    AlreadyLiked,

    #[error("recipe not liked yet")]
    NotLikedYet,

    #[error("cannot subscribe to yourself")]
    YourselfSubscribe,

    #[error("cannot unsubscribe from yourself")]
    YourselfUnsubscribe,

    #[error("already subscribed")]
    AlreadySubscribed,

    #[error("not subscribed")]
    AlreadyUnsubscribed,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Persisting failed and the cleanup of already uploaded photos failed too
    #[error("{operation} failed: {cause}; photo cleanup also failed: {cleanup}")]
    CompensationFailed {
        operation: &'static str,
        cause: anyhow::Error,
        cleanup: anyhow::Error,
    },

    /// The recipe exists but subscribers were not notified
    #[error("recipe {recipe_id} created but notification failed: {source}")]
    NotificationPublish {
        recipe_id: RecipeId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Recipe id that was persisted despite the error, if any
    pub fn created_recipe_id(&self) -> Option<RecipeId> {
        match self {
            ServiceError::NotificationPublish { recipe_id, .. } => Some(*recipe_id),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::RecipeNotFound(_)
            | ServiceError::UserNotFound
            | ServiceError::CommentNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::PermissionDenied => StatusCode::FORBIDDEN,
            ServiceError::EmptyPhotos
            | ServiceError::BadOrderField(_)
            | ServiceError::YourselfSubscribe
            | ServiceError::YourselfUnsubscribe
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::AlreadyLiked
            | ServiceError::NotLikedYet
            | ServiceError::AlreadySubscribed
            | ServiceError::AlreadyUnsubscribed => StatusCode::CONFLICT,
            ServiceError::Cache(_)
            | ServiceError::CompensationFailed { .. }
            | ServiceError::NotificationPublish { .. }
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        HttpResponse::build(status).json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }))
    }
}

/// Result type for recipe-service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
