use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::core::MatchEngine;
use crate::models::{ErrorResponse, FindMatchRequest, FindMatchResponse, HealthResponse};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let catalog_size = state.engine.store().len();
    let status = if catalog_size > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        catalog_size,
    })
}

/// Find match endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "name": "string",
///   "age": 28,
///   "gender": "Male|Female",
///   "profession": "string",
///   "education": "string",
///   "location": "string",
///   "number": "923121234567",
///   "customPrompt": "string"
/// }
/// ```
async fn find_match(
    state: web::Data<AppState>,
    req: web::Json<FindMatchRequest>,
) -> impl Responder {
    let profile = match req.into_inner().into_profile() {
        Ok(profile) => profile,
        Err(e) => {
            tracing::info!("Rejected find_match request: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };

    let outcome = state.engine.find_match(&profile).await;

    tracing::info!(
        "Request {} finished: matched={}, dispatch={:?}",
        outcome.request_id,
        outcome.is_match(),
        outcome.dispatch_status
    );

    HttpResponse::Ok().json(FindMatchResponse::from(outcome))
}
