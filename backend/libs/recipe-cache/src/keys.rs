//! Cache key schema
//!
//! Key format: {entity}:{identifier}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Bare recipe body
    /// Format: recipe:{recipe_id}
    pub fn recipe(recipe_id: i64) -> String {
        format!("recipe:{}", recipe_id)
    }

    /// Author projection of a user
    /// Format: author:{user_id}
    pub fn author(user_id: i64) -> String {
        format!("author:{}", user_id)
    }

    /// Extract entity type from key
    pub fn entity_type(key: &str) -> Option<&str> {
        match key.split_once(':') {
            Some((entity, _)) if !entity.is_empty() => Some(entity),
            _ => None,
        }
    }
}
