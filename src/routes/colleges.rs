use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    AdmissionRequest, AdmissionResponse, ErrorResponse, ImageQuery, LikedCollegesResponse,
    LikedCountResponse,
};
use crate::routes::deck::AppState;
use crate::services::ImageError;

/// Configure likes, top picks, images and advisor routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/colleges", web::get().to(top_picks))
        .route("/users/{user_id}/likes", web::get().to(liked_colleges))
        .route("/users/{user_id}/likes/count", web::get().to(liked_count))
        .route("/images", web::get().to(image))
        .route("/advisor/admission", web::post().to(admission));
}

/// Every college, unfiltered
///
/// GET /api/v1/colleges
async fn top_picks(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.catalog.all_colleges().await)
}

/// GET /api/v1/users/{userId}/likes
async fn liked_colleges(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    let liked = state.catalog.liked_colleges(&user_id).await;

    HttpResponse::Ok().json(LikedCollegesResponse {
        user_id,
        count: liked.cards.len(),
        colleges: liked.cards,
        skipped: liked.skipped,
    })
}

/// GET /api/v1/users/{userId}/likes/count
async fn liked_count(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    let count = state.catalog.liked_count(&user_id).await;
    HttpResponse::Ok().json(LikedCountResponse { user_id, count })
}

/// Card image bytes through the image cache. Only the `imageURL` of a known
/// card is served.
///
/// GET /api/v1/images?url={imageURL}
async fn image(state: web::Data<AppState>, query: web::Query<ImageQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    if !state.catalog.is_known_image(&query.url).await {
        return HttpResponse::NotFound().json(ErrorResponse::new(
            "Unknown image",
            "url is not the image of any college card",
            404,
        ));
    }

    match state.images.load(&query.url).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(bytes.to_vec()),
        Err(ImageError::BadStatus(status)) => HttpResponse::NotFound().json(ErrorResponse::new(
            "Image unavailable",
            format!("image host returned {}", status),
            404,
        )),
        Err(ImageError::TooLarge { limit }) => {
            tracing::warn!("Image {} exceeds {} bytes", query.url, limit);
            HttpResponse::PayloadTooLarge().json(ErrorResponse::new(
                "Image too large",
                format!("image exceeds {} bytes", limit),
                413,
            ))
        }
        Err(e) => {
            tracing::warn!("Failed to load image {}: {}", query.url, e);
            HttpResponse::BadGateway().json(ErrorResponse::new(
                "Image unavailable",
                e.to_string(),
                502,
            ))
        }
    }
}

/// Admission guess for the user's stored profile
///
/// POST /api/v1/advisor/admission
async fn admission(
    state: web::Data<AppState>,
    req: web::Json<AdmissionRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            errors.to_string(),
            400,
        ));
    }

    let profile = state.profiles.current(&req.user_id).await;
    let likely_admitted = state
        .advisor
        .check_admission(&profile, &req.college_name)
        .await;

    HttpResponse::Ok().json(AdmissionResponse {
        college_name: req.college_name.clone(),
        likely_admitted,
    })
}
