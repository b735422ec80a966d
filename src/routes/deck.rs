use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::Translation;
use crate::models::{Decision, DragRequest, ErrorResponse, ForceSwipeRequest, HealthResponse};
use crate::services::{
    AdmissionAdvisor, Authenticator, CacheManager, CollegeCatalog, ImageLoader, ProfileService,
    SessionRegistry,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub catalog: Arc<CollegeCatalog>,
    pub auth: Arc<Authenticator>,
    pub profiles: Arc<ProfileService>,
    pub images: Arc<ImageLoader>,
    pub advisor: Arc<AdmissionAdvisor>,
    pub cache: Arc<CacheManager>,
}

/// Configure health and deck routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/deck/{user_id}", web::get().to(get_deck))
        .route("/deck/{user_id}", web::delete().to(close_deck))
        .route("/deck/{user_id}/reload", web::post().to(reload_deck))
        .route("/deck/{user_id}/drag", web::post().to(drag))
        .route("/deck/{user_id}/release", web::post().to(release))
        .route("/deck/{user_id}/force", web::post().to(force_swipe));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let stats = state.cache.stats();
    tracing::trace!(
        "Health check: {} active decks, {} cached user records",
        state.sessions.len().await,
        stats.entries
    );

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Current deck
///
/// GET /api/v1/deck/{userId}
async fn get_deck(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session = state.sessions.session(&path).await;
    HttpResponse::Ok().json(session.view().await)
}

/// Drop the user's live deck; the next request loads a fresh one
///
/// DELETE /api/v1/deck/{userId}
async fn close_deck(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    if state.sessions.close(&path).await {
        HttpResponse::NoContent().finish()
    } else {
        HttpResponse::NotFound().json(ErrorResponse::new(
            "Deck not found",
            format!("no open deck for {}", path.as_str()),
            404,
        ))
    }
}

/// Refetch the deck; the reload button is always available
///
/// POST /api/v1/deck/{userId}/reload
async fn reload_deck(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session = state.sessions.session(&path).await;
    let view = session.reload().await;

    tracing::info!("Reloaded deck for {}: {} cards", path.as_str(), view.remaining);

    HttpResponse::Ok().json(view)
}

/// Live drag update
///
/// POST /api/v1/deck/{userId}/drag
///
/// Request body:
/// ```json
/// { "dx": -42.0, "dy": 3.5 }
/// ```
async fn drag(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<DragRequest>,
) -> impl Responder {
    if !req.dx.is_finite() || !req.dy.is_finite() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Invalid translation",
            "dx and dy must be finite numbers",
            400,
        ));
    }

    let session = state.sessions.session(&path).await;
    HttpResponse::Ok().json(session.drag(Translation::new(req.dx, req.dy)).await)
}

/// Drag released
///
/// POST /api/v1/deck/{userId}/release
async fn release(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let session = state.sessions.session(&path).await;
    HttpResponse::Ok().json(session.release().await)
}

/// Like or dislike button
///
/// POST /api/v1/deck/{userId}/force
///
/// Request body:
/// ```json
/// { "direction": "like|dislike" }
/// ```
async fn force_swipe(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ForceSwipeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    let Some(decision) = Decision::parse(&req.direction) else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Invalid direction",
            "Direction must be one of: like, dislike",
            400,
        ));
    };

    let session = state.sessions.session(&path).await;
    HttpResponse::Ok().json(session.force(decision).await)
}
