/// Recipe Service Library
///
/// Recipe retrieval and mutation for the recipe platform: a cache-aside read
/// aggregate over recipes, authors, likes and comments, plus creator
/// subscriptions and new-recipe notifications.
///
/// # Modules
///
/// - `models`: Recipes, authors, comments, subscriptions and query types
/// - `services`: Business logic layer
/// - `db`: Store traits and their Postgres repositories
/// - `storage`: Photo storage on S3
/// - `kafka`: New-recipe notification publisher
/// - `error`: Error types and HTTP status mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and the `/metrics` handler
pub mod config;
pub mod db;
pub mod error;
pub mod kafka;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use services::{Collaborators, Services};
