use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::RecipeStore;
use crate::models::{Complexity, PhotoUrls, Recipe, RecipeDraft, RecipeId, RecipeQuery};

pub(crate) const RECIPE_COLUMNS: &str = "id, user_id, title, about, complexity, need_time, \
     ingredients, instructions, photos_urls, created_at, updated_at";

/// Row as stored; photo URLs are a single `;`-joined column
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecipeRow {
    id: i64,
    user_id: i64,
    title: String,
    about: String,
    complexity: i16,
    need_time: String,
    ingredients: String,
    instructions: String,
    photos_urls: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = anyhow::Error;

    fn try_from(row: RecipeRow) -> Result<Self> {
        let complexity = Complexity::try_from(row.complexity)
            .map_err(|e| anyhow::anyhow!("recipe {}: {}", row.id, e))?;

        Ok(Recipe {
            id: row.id,
            owner_id: row.user_id,
            title: row.title,
            about: row.about,
            complexity,
            need_time: row.need_time,
            ingredients: row.ingredients,
            instructions: row.instructions,
            photo_urls: PhotoUrls::parse(&row.photos_urls),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn into_recipes(rows: Vec<RecipeRow>) -> Result<Vec<Recipe>> {
    rows.into_iter().map(Recipe::try_from).collect()
}

/// Postgres-backed recipe repository
#[derive(Clone)]
pub struct PgRecipeRepository {
    pool: PgPool,
}

impl PgRecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape `%`, `_` and `\` so user text matches literally under `ESCAPE '\'`
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Builds the search query. Only whitelisted column names and keywords are
/// spliced into the SQL; user text is always bound.
fn filtered_query(query: &RecipeQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM recipes", RECIPE_COLUMNS));

    if !query.text.is_empty() {
        let pattern = format!("%{}%", escape_like(&query.text));
        builder
            .push(" WHERE title ILIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR about ILIKE ")
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\' OR ingredients ILIKE ")
            .push_bind(pattern)
            .push(r" ESCAPE '\'");
    }

    builder.push(" ORDER BY ").push(query.order.column());
    if let Some(direction) = query.direction {
        builder.push(" ").push(direction.keyword());
    }
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    if let Some(offset) = query.offset {
        builder.push(" OFFSET ").push_bind(offset);
    }

    builder
}

#[async_trait::async_trait]
impl RecipeStore for PgRecipeRepository {
    async fn get_all(&self) -> Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {} FROM recipes ORDER BY id",
            RECIPE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to load recipes")?;

        into_recipes(rows)
    }

    async fn get_filtered(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
        let rows = filtered_query(query)
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.pool)
            .await
            .context("failed to search recipes")?;

        into_recipes(rows)
    }

    async fn get(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {} FROM recipes WHERE id = $1",
            RECIPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load recipe {}", id))?;

        row.map(Recipe::try_from).transpose()
    }

    async fn exists(&self, id: RecipeId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM recipes WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create(&self, draft: &RecipeDraft) -> Result<RecipeId> {
        let fields = &draft.fields;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (user_id, title, about, complexity, need_time,
                                 ingredients, instructions, photos_urls)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(draft.owner_id)
        .bind(&fields.title)
        .bind(&fields.about)
        .bind(i16::from(fields.complexity))
        .bind(&fields.need_time)
        .bind(&fields.ingredients)
        .bind(&fields.instructions)
        .bind(draft.photo_urls.join())
        .fetch_one(&self.pool)
        .await
        .context("failed to insert recipe")?;

        Ok(id)
    }

    async fn update(&self, recipe: &Recipe) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE recipes
            SET title = $2, about = $3, complexity = $4, need_time = $5,
                ingredients = $6, instructions = $7, photos_urls = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(recipe.id)
        .bind(&recipe.title)
        .bind(&recipe.about)
        .bind(i16::from(recipe.complexity))
        .bind(&recipe.need_time)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(recipe.photo_urls.join())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update recipe {}", recipe.id))?;

        Ok(())
    }

    async fn delete(&self, id: RecipeId) -> Result<()> {
        sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete recipe {}", id))?;

        Ok(())
    }
}
