use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    ErrorResponse, InterestRequest, JobStatus, PostingStatusRequest, SavePostingRequest,
    TitlesQuery,
};
use crate::routes::feed::{error_kind_response, AppState};

/// Configure employer-facing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/postings/titles", web::get().to(unique_titles))
        .route("/postings", web::post().to(create_posting))
        .route("/postings/{id}", web::put().to(update_posting))
        .route("/postings/{id}/status", web::post().to(set_posting_status))
        .route("/interests", web::post().to(register_interest));
}

/// Unique titles endpoint
///
/// GET /api/v1/postings/titles?employerId=...
///
/// One representative posting per distinct title among the employer's live
/// postings, for dashboards that group postings by role.
async fn unique_titles(
    state: web::Data<AppState>,
    query: web::Query<TitlesQuery>,
) -> impl Responder {
    match state
        .orchestrator
        .unique_titles(&query.employer_id, chrono::Utc::now())
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(kind) => error_kind_response(kind),
    }
}

/// Create posting endpoint
///
/// POST /api/v1/postings
async fn create_posting(
    state: web::Data<AppState>,
    req: web::Json<SavePostingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create posting request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let employer_id = req.employer_id.clone();

    match state
        .orchestrator
        .create_posting(&employer_id, req.into_draft(), chrono::Utc::now())
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(kind) => error_kind_response(kind),
    }
}

/// Update posting endpoint
///
/// PUT /api/v1/postings/{id}
async fn update_posting(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<SavePostingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let posting_id = path.into_inner();
    let req = req.into_inner();
    let employer_id = req.employer_id.clone();

    match state
        .orchestrator
        .update_posting(&employer_id, &posting_id, req.into_draft(), chrono::Utc::now())
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(kind) => error_kind_response(kind),
    }
}

/// Posting status endpoint
///
/// POST /api/v1/postings/{id}/status
///
/// Request body:
/// ```json
/// {
///   "employerId": "string",
///   "status": "active|paused|closed"
/// }
/// ```
async fn set_posting_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<PostingStatusRequest>,
) -> impl Responder {
    let status = match JobStatus::parse(req.status.to_lowercase().as_str()) {
        Some(status) => status,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid status".to_string(),
                message: "Status must be one of: active, paused, closed".to_string(),
                status_code: 400,
            });
        }
    };

    match state
        .orchestrator
        .set_posting_status(&req.employer_id, &path.into_inner(), status, chrono::Utc::now())
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(kind) => error_kind_response(kind),
    }
}

/// Employer interest endpoint
///
/// POST /api/v1/interests
///
/// Registers interest in a seeker for one posting; when the seeker already
/// liked the posting the response carries the match this signal completed.
async fn register_interest(
    state: web::Data<AppState>,
    req: web::Json<InterestRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match state
        .orchestrator
        .register_interest(
            &req.employer_id,
            &req.seeker_id,
            &req.posting_id,
            chrono::Utc::now(),
        )
        .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(kind) => error_kind_response(kind),
    }
}
