use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use chrono::Utc;
use recipe_cache::{CacheMetrics, RedisCacheStore, RedisPool};
use recipe_service::db::{
    PgCommentRepository, PgLikeRepository, PgRecipeRepository, PgSubscriptionRepository,
    PgUserRepository,
};
use recipe_service::kafka::{KafkaNotificationPublisher, KafkaPublisherConfig};
use recipe_service::storage::S3FileStore;
use recipe_service::{Collaborators, Config, Services};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct HealthState {
    db_pool: sqlx::PgPool,
    redis: Arc<RedisPool>,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }
}

fn component_check<E: std::fmt::Display>(
    name: &str,
    result: Result<(), E>,
    started: Instant,
) -> ComponentCheck {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: format!("{} reachable", name),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{} check failed: {}", name, e),
            latency_ms,
        },
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "recipe-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "recipe-service"
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let postgres = state.check_postgres().await;
    checks.insert(
        "postgresql".to_string(),
        component_check("PostgreSQL", postgres, start),
    );

    let start = Instant::now();
    let redis = state.redis.ping().await;
    checks.insert("redis".to_string(), component_check("Redis", redis, start));

    let ready = checks
        .values()
        .all(|check| matches!(check.status, ComponentStatus::Healthy));
    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,recipe_service=debug,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {:#}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting recipe-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .map_err(|e| startup_error("Failed to create database pool", e))?;
    tracing::info!("Connected to database");

    let redis = Arc::new(
        RedisPool::connect(&config.cache.url)
            .await
            .map_err(|e| startup_error("Failed to initialize Redis connection", e))?,
    );
    if let Err(e) = CacheMetrics::register(prometheus::default_registry()) {
        tracing::warn!("Cache metrics registration failed: {}", e);
    }

    let publisher = KafkaNotificationPublisher::new(&KafkaPublisherConfig::from(&config.kafka))
        .map_err(|e| startup_error("Failed to create Kafka producer", e))?;

    let files = S3FileStore::connect(config.s3.clone()).await;
    if let Err(e) = files.health_check().await {
        tracing::warn!("Photo bucket check failed: {:#}", e);
    }

    let services = Services::new(&Collaborators {
        cache: Arc::new(RedisCacheStore::new(redis.manager())),
        recipes: Arc::new(PgRecipeRepository::new(db_pool.clone())),
        users: Arc::new(PgUserRepository::new(db_pool.clone())),
        likes: Arc::new(PgLikeRepository::new(db_pool.clone())),
        comments: Arc::new(PgCommentRepository::new(db_pool.clone())),
        subscriptions: Arc::new(PgSubscriptionRepository::new(db_pool.clone())),
        files: Arc::new(files),
        publisher: Arc::new(publisher),
    });

    let services_data = web::Data::new(services);
    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
        redis: redis.clone(),
    });

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(services_data.clone())
            .app_data(health_state.clone())
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(recipe_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
    })
    .bind(&http_bind_address)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");
    server_handle.stop(true).await;

    let result = match server_task.await {
        Ok(result) => result,
        Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
    };

    db_pool.close().await;
    tracing::info!("Recipe-service shutting down");
    result
}
