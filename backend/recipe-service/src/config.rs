/// Configuration management for recipe-service
///
/// Everything is read from environment variables. `main` loads `.env` through
/// dotenvy before calling `Config::from_env`.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub kafka: KafkaConfig,
    pub s3: S3Config,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub url: String,
}

/// Kafka configuration for the new-recipe notification topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub new_recipe_topic: String,
    #[serde(default = "default_kafka_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Photo storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    /// Custom endpoint for S3-compatible storage, empty for AWS
    pub endpoint: String,
    pub region: String,
    /// Prefix of the public photo URLs, `<base>/<bucket>/<key>`
    pub public_base_url: String,
    /// Icon shared by users without a custom one; never removed
    pub default_icon_url: String,
}

impl S3Config {
    /// Public URL of an object in the photo bucket
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("RECIPE_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("RECIPE_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: {
                let url = std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/recipes".to_string());
                if production && (url.contains("localhost") || url.contains("127.0.0.1")) {
                    return Err("DATABASE_URL must point to a real database in production".to_string());
                }

                DatabaseConfig {
                    url,
                    max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                        .ok()
                        .and_then(|c| c.parse().ok())
                        .unwrap_or(10),
                }
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            kafka: KafkaConfig {
                brokers: parse_brokers(
                    &std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string()),
                ),
                new_recipe_topic: std::env::var("KAFKA_NEW_RECIPE_TOPIC")
                    .unwrap_or_else(|_| "new_recipe".to_string()),
                request_timeout_ms: std::env::var("KAFKA_REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_else(default_kafka_request_timeout_ms),
            },
            s3: {
                let bucket = std::env::var("S3_BUCKET_NAME").unwrap_or_default();
                if production && bucket.trim().is_empty() {
                    return Err("S3_BUCKET_NAME must be set in production".to_string());
                }
                let endpoint = std::env::var("S3_ENDPOINT").unwrap_or_default();
                let public_base_url =
                    std::env::var("S3_PUBLIC_BASE_URL").unwrap_or_else(|_| endpoint.clone());

                S3Config {
                    bucket,
                    endpoint,
                    region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                    public_base_url,
                    default_icon_url: std::env::var("DEFAULT_ICON_URL").unwrap_or_default(),
                }
            },
        })
    }
}

fn parse_brokers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn default_kafka_request_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brokers_skips_blanks() {
        assert_eq!(
            parse_brokers("kafka-1:9092, kafka-2:9092,,"),
            vec!["kafka-1:9092".to_string(), "kafka-2:9092".to_string()]
        );
    }

    #[test]
    fn test_object_url() {
        let config = S3Config {
            bucket: "photos".to_string(),
            endpoint: "http://minio:9000".to_string(),
            region: "us-east-1".to_string(),
            public_base_url: "http://cdn.example.com/".to_string(),
            default_icon_url: String::new(),
        };
        assert_eq!(
            config.object_url("abc"),
            "http://cdn.example.com/photos/abc"
        );
    }
}
