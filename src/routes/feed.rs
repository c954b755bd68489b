use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::engine::FeedOrchestrator;
use crate::models::{Decision, ErrorKind, ErrorResponse, FeedQuery, HealthResponse, SwipeRequest};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FeedOrchestrator>,
}

/// Configure seeker-facing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/feed", web::get().to(get_feed))
        .route("/swipes", web::post().to(record_swipe))
        .route("/filters", web::get().to(filter_options));
}

/// HTTP status an error kind travels with.
pub(crate) fn error_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Plain error body for endpoints whose success shape has no error field.
pub(crate) fn error_kind_response(kind: ErrorKind) -> HttpResponse {
    let status = error_status(kind);
    let (error, message) = match kind {
        ErrorKind::NotAuthenticated => ("Not authenticated", "A non-blank caller id is required"),
        ErrorKind::QuotaExceeded => ("Quota exceeded", "Daily swipe limit reached"),
        ErrorKind::NotFound => ("Not found", "No live posting with that id"),
        ErrorKind::Forbidden => ("Forbidden", "The posting belongs to another employer"),
        ErrorKind::StorageUnavailable => ("Storage unavailable", "Catalog store is unreachable"),
    };

    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
///
/// GET /api/v1/health
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.orchestrator.health().await;
    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Job feed endpoint
///
/// GET /api/v1/feed?seekerId=...&location=Manila&jobType=Nanny&limit=24&offset=0
///
/// Answers 200 with a quota snapshot even when the catalog is degraded; the
/// body carries `errorKind` instead of an error status. Only an unknown
/// caller gets a non-200.
async fn get_feed(state: web::Data<AppState>, query: web::Query<FeedQuery>) -> impl Responder {
    let query = query.into_inner();

    let response = state
        .orchestrator
        .get_feed(&query.seeker_id, query.filter_spec(), chrono::Utc::now())
        .await;

    match response.error_kind {
        Some(ErrorKind::NotAuthenticated) => HttpResponse::Unauthorized().json(response),
        _ => HttpResponse::Ok().json(response),
    }
}

/// Swipe endpoint
///
/// POST /api/v1/swipes
///
/// Request body:
/// ```json
/// {
///   "seekerId": "string",
///   "postingId": "string",
///   "decision": "like|pass"
/// }
/// ```
///
/// Rejections keep the same body shape as successes so the client always has
/// the quota snapshot: QuotaExceeded maps to 429, NotFound to 404.
async fn record_swipe(state: web::Data<AppState>, req: web::Json<SwipeRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for swipe request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let decision = match Decision::parse(req.decision.to_lowercase().as_str()) {
        Some(decision) => decision,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid decision".to_string(),
                message: "Decision must be one of: like, pass".to_string(),
                status_code: 400,
            });
        }
    };

    let response = state
        .orchestrator
        .swipe(&req.seeker_id, &req.posting_id, decision, chrono::Utc::now())
        .await;

    match response.error_kind {
        Some(kind) => HttpResponse::build(error_status(kind)).json(response),
        None => HttpResponse::Ok().json(response),
    }
}

/// Filter options endpoint
///
/// GET /api/v1/filters
async fn filter_options(state: web::Data<AppState>) -> impl Responder {
    // Degraded vocabularies still render a usable filter sheet, so this
    // endpoint never fails over to an error status.
    let response = state.orchestrator.filter_options(chrono::Utc::now()).await;
    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(ErrorKind::NotAuthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            error_status(ErrorKind::QuotaExceeded),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(error_status(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(error_status(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            error_status(ErrorKind::StorageUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
