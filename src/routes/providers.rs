use crate::core::{SearchEngine, SearchError};
use crate::models::{ErrorResponse, HealthResponse, ProviderSearchRequest, ProviderSearchResponse};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub request_timeout: Duration,
}

/// Configure all provider-search routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/providers/search", web::post().to(search_providers));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Provider search endpoint
///
/// POST /api/v1/providers/search
///
/// Request body:
/// ```json
/// {
///   "zip": "85251",
///   "radius": 25,
///   "contactId": "string",
///   "resultCount": 10
/// }
/// ```
async fn search_providers(
    state: web::Data<AppState>,
    req: web::Json<ProviderSearchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for provider search request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    // Cap result count to prevent excessive responses
    let result_count = req.result_count.min(100) as usize;

    tracing::info!(
        "Provider search - zip: {}, radius: {}, contactId: {}, resultCount: {}",
        req.zip,
        req.radius,
        req.contact_id,
        result_count
    );

    // The whole pipeline runs under one deadline; expiry abandons the
    // request without partial output.
    let outcome = tokio::time::timeout(
        state.request_timeout,
        state
            .engine
            .search(&req.zip, req.radius, &req.contact_id, result_count),
    )
    .await;

    match outcome {
        Ok(Ok(providers)) => {
            tracing::info!("Returning {} providers", providers.len());
            HttpResponse::Ok().json(ProviderSearchResponse::ok(providers))
        }
        Ok(Err(err @ SearchError::ContactNotFound(_)))
        | Ok(Err(err @ SearchError::NoAccounts { .. })) => {
            tracing::info!("Provider search found nothing: {}", err);
            HttpResponse::NotFound().body(err.to_string())
        }
        Ok(Err(err)) => {
            tracing::error!("Provider search failed: {}", err);
            HttpResponse::BadRequest().json(ProviderSearchResponse::failure(err.to_string()))
        }
        Err(_) => {
            tracing::error!("Provider search exceeded the request deadline");
            HttpResponse::BadRequest().json(ProviderSearchResponse::failure(
                "request deadline exceeded".to_string(),
            ))
        }
    }
}
