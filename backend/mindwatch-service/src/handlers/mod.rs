/// HTTP handlers for mindwatch-service
pub mod analyze;
pub mod doctors;
pub mod patients;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::metrics;

/// Liveness probe
///
/// GET /
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Mental health analysis API is online"
    }))
}

/// Mount every route and the shared extractor configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .route("/", web::get().to(root))
        .route("/health", web::get().to(|| async { "OK" }))
        .route("/metrics", web::get().to(metrics::serve_metrics));

    analyze::register_routes(cfg);
    doctors::register_routes(cfg);
    patients::register_routes(cfg);
}
