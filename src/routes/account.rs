use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{CredentialsRequest, ErrorResponse, ProfileUpdateRequest};
use crate::routes::deck::AppState;
use crate::services::AuthError;

/// Configure auth and profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/auth/signin", web::post().to(sign_in))
        .route("/auth/signup", web::post().to(sign_up))
        .route("/users/{user_id}/profile", web::get().to(get_profile))
        .route("/users/{user_id}/profile", web::put().to(update_profile));
}

fn auth_error_response(err: AuthError) -> HttpResponse {
    let body = |status: u16| ErrorResponse::new("Authentication failed", err.to_string(), status);

    match &err {
        AuthError::InvalidCredentials => HttpResponse::Unauthorized().json(body(401)),
        AuthError::EmailTaken => HttpResponse::Conflict().json(body(409)),
        AuthError::Validation(_) => HttpResponse::BadRequest().json(body(400)),
        AuthError::Service(_) | AuthError::RequestError(_) => {
            tracing::error!("Identity service failure: {}", err);
            HttpResponse::BadGateway().json(body(502))
        }
    }
}

/// POST /api/v1/auth/signin
async fn sign_in(state: web::Data<AppState>, req: web::Json<CredentialsRequest>) -> impl Responder {
    match state.auth.sign_in(&req).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e) => auth_error_response(e),
    }
}

/// POST /api/v1/auth/signup
async fn sign_up(state: web::Data<AppState>, req: web::Json<CredentialsRequest>) -> impl Responder {
    match state.auth.sign_up(&req).await {
        Ok(session) => HttpResponse::Created().json(session),
        Err(e) => auth_error_response(e),
    }
}

/// GET /api/v1/users/{userId}/profile
async fn get_profile(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    HttpResponse::Ok().json(state.profiles.current(&path).await)
}

/// Save the profile editor
///
/// PUT /api/v1/users/{userId}/profile
///
/// Request body:
/// ```json
/// { "profile": { ... } }
/// ```
async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ProfileUpdateRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    let user_id = path.into_inner();
    let ProfileUpdateRequest { profile } = req.into_inner();

    match state.profiles.update(&user_id, profile).await {
        Ok(saved) => HttpResponse::Ok().json(saved),
        Err(e) => {
            tracing::error!("Failed to save profile: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Failed to save profile",
                e.to_string(),
                500,
            ))
        }
    }
}
