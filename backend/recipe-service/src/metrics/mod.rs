//! Prometheus metrics for recipe-service.
//!
//! Service-level collectors plus the `/metrics` handler. Cache counters live
//! in recipe-cache and are registered into the default registry at startup.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// New-recipe notifications by outcome (success/error).
    pub static ref RECIPE_EVENTS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "recipe_events_published_total",
        "New recipe notifications segmented by outcome",
        &["result"]
    )
    .expect("failed to register recipe_events_published_total");

    /// Photo removals compensating a failed persist, by operation and outcome.
    pub static ref PHOTO_COMPENSATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "recipe_photo_compensations_total",
        "Photo removals after a failed recipe write segmented by operation and outcome",
        &["operation", "result"]
    )
    .expect("failed to register recipe_photo_compensations_total");

    /// Best-effort removals of photos that are no longer referenced.
    pub static ref PHOTO_CLEANUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "recipe_photo_cleanups_total",
        "Removals of replaced or orphaned photos segmented by operation and outcome",
        &["operation", "result"]
    )
    .expect("failed to register recipe_photo_cleanups_total");
}

pub fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
