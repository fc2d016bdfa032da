use futures::future::try_join_all;
use std::sync::Arc;
use validator::Validate;

use super::AuthorResolver;
use crate::db::{CommentRegistry, RecipeStore};
use crate::error::{Result, ServiceError};
use crate::models::{Comment, CommentId, CommentText, CommentView, RecipeId, UserId};

/// Comments of a recipe with their authors resolved, oldest first
pub(crate) async fn comment_views(
    comments: &dyn CommentRegistry,
    authors: &AuthorResolver,
    recipe_id: RecipeId,
) -> Result<Vec<CommentView>> {
    let comments = comments.list(recipe_id).await?;

    try_join_all(comments.into_iter().map(|comment| async move {
        let author = authors.get_author(comment.user_id).await?;
        Ok::<_, ServiceError>(CommentView {
            id: comment.id,
            author,
            text: comment.text,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }))
    .await
}

/// Comments on recipes. Only a comment's author may edit or delete it.
pub struct CommentService {
    recipes: Arc<dyn RecipeStore>,
    comments: Arc<dyn CommentRegistry>,
    authors: Arc<AuthorResolver>,
}

impl CommentService {
    pub fn new(
        recipes: Arc<dyn RecipeStore>,
        comments: Arc<dyn CommentRegistry>,
        authors: Arc<AuthorResolver>,
    ) -> Self {
        Self {
            recipes,
            comments,
            authors,
        }
    }

    pub async fn add(
        &self,
        user_id: UserId,
        recipe_id: RecipeId,
        text: CommentText,
    ) -> Result<Comment> {
        text.validate()?;

        if !self.recipes.exists(recipe_id).await? {
            return Err(ServiceError::RecipeNotFound(recipe_id));
        }

        Ok(self.comments.create(user_id, recipe_id, &text.text).await?)
    }

    pub async fn update(&self, user_id: UserId, comment_id: CommentId, text: CommentText) -> Result<()> {
        text.validate()?;
        self.owned_comment(user_id, comment_id).await?;

        Ok(self.comments.update_text(comment_id, &text.text).await?)
    }

    pub async fn delete(&self, user_id: UserId, comment_id: CommentId) -> Result<()> {
        self.owned_comment(user_id, comment_id).await?;

        Ok(self.comments.delete(comment_id).await?)
    }

    pub async fn list(&self, recipe_id: RecipeId) -> Result<Vec<CommentView>> {
        comment_views(&*self.comments, &self.authors, recipe_id).await
    }

    async fn owned_comment(&self, user_id: UserId, comment_id: CommentId) -> Result<Comment> {
        let comment = self
            .comments
            .get(comment_id)
            .await?
            .ok_or(ServiceError::CommentNotFound(comment_id))?;

        if comment.user_id != user_id {
            return Err(ServiceError::PermissionDenied);
        }

        Ok(comment)
    }
}
