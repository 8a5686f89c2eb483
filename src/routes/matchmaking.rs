use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::core::Matchmaker;
use crate::error::MatchError;
use crate::models::{
    HealthResponse, LoginResponse, LoginUser, SubmitFeedbackResponse, SuccessResponse,
    SwipeRequest,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matchmaker: Arc<Matchmaker>,
}

type PairPath = web::Path<(String, String)>;

/// Configure all matchmaking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/login/{name}", web::get().to(login))
        .route("/profiles/{user_id}", web::get().to(candidate_feed))
        .route("/swipe", web::post().to(record_swipe))
        .route("/stats/{user_id}", web::get().to(swipe_stats))
        .route("/likes/{user_id}", web::get().to(liked))
        .route("/likes/{user_id}/{swiped_user_id}", web::delete().to(unlike))
        .route("/match/{user_id}/{target_user_id}", web::delete().to(remove_match))
        .route("/phone/{user_id}", web::get().to(contact))
        .route("/advice/{user_id}/{target_user_id}", web::get().to(advice))
        .route("/wingman/{user_id}/{target_user_id}", web::get().to(wingman))
        .route("/feedback/{user_id}/{target_user_id}", web::post().to(submit_feedback))
        .route("/feedback/{user_id}/{target_user_id}", web::get().to(list_feedback))
        .route("/feedback-summary/{user_id}/{target_user_id}", web::get().to(feedback_summary))
        .route("/dashboard/{user_id}/{target_user_id}", web::get().to(dashboard));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let db_healthy = state.matchmaker.ledger().health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        profiles: state.matchmaker.profiles().len(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/login/{name}
///
/// An unknown name is not an HTTP error: the body reports `success: false`.
async fn login(state: web::Data<AppState>, name: web::Path<String>) -> Result<HttpResponse, MatchError> {
    let response = match state.matchmaker.login(&name) {
        Ok(profile) => LoginResponse {
            success: true,
            user: Some(LoginUser {
                user_id: profile.user_id.clone(),
                name: profile.name.clone(),
            }),
            message: None,
        },
        Err(MatchError::NotFound(_)) => LoginResponse {
            success: false,
            user: None,
            message: Some("User not found".to_string()),
        },
        Err(e) => return Err(e),
    };

    Ok(HttpResponse::Ok().json(response))
}

async fn candidate_feed(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let feed = state.matchmaker.candidate_feed(&user_id).await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// Record swipe endpoint
///
/// POST /api/v1/swipe
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "swipedUserId": "string",
///   "direction": "left|right"
/// }
/// ```
async fn record_swipe(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse, MatchError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for swipe request: {:?}", errors);
        return Err(MatchError::InvalidInput(errors.to_string()));
    }

    state
        .matchmaker
        .swipe(&req.user_id, &req.swiped_user_id, &req.direction)
        .await?;

    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn swipe_stats(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let stats = state.matchmaker.swipe_stats(&user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn liked(state: web::Data<AppState>, user_id: web::Path<String>) -> Result<HttpResponse, MatchError> {
    let matches = state.matchmaker.liked(&user_id).await?;
    Ok(HttpResponse::Ok().json(matches))
}

async fn unlike(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, swiped_user_id) = path.into_inner();
    state.matchmaker.unlike(&user_id, &swiped_user_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn remove_match(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    state.matchmaker.remove_match(&user_id, &target_user_id).await?;
    Ok(HttpResponse::Ok().json(SuccessResponse { success: true }))
}

async fn contact(state: web::Data<AppState>, user_id: web::Path<String>) -> Result<HttpResponse, MatchError> {
    let card = state.matchmaker.contact(&user_id)?;
    Ok(HttpResponse::Ok().json(card))
}

async fn advice(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    let report = state.matchmaker.advice(&user_id, &target_user_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Wingman audio endpoint, responds with `audio/mpeg`
async fn wingman(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    let audio = state.matchmaker.wingman(&user_id, &target_user_id).await?;
    Ok(HttpResponse::Ok().content_type("audio/mpeg").body(audio))
}

/// Feedback upload endpoint
///
/// POST /api/v1/feedback/{user_id}/{target_user_id}
///
/// The body is the raw recording (mono 16 kHz WAV), forwarded untouched to
/// the transcription service.
async fn submit_feedback(
    state: web::Data<AppState>,
    path: PairPath,
    body: web::Bytes,
) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    let entry = state
        .matchmaker
        .submit_feedback(&user_id, &target_user_id, body.to_vec())
        .await?;

    Ok(HttpResponse::Ok().json(SubmitFeedbackResponse {
        success: true,
        transcript: entry.transcript,
    }))
}

async fn list_feedback(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    let entries = state.matchmaker.feedback(&user_id, &target_user_id).await?;
    Ok(HttpResponse::Ok().json(entries))
}

async fn feedback_summary(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    let summary = state.matchmaker.feedback_summary(&user_id, &target_user_id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

async fn dashboard(state: web::Data<AppState>, path: PairPath) -> Result<HttpResponse, MatchError> {
    let (user_id, target_user_id) = path.into_inner();
    let assessment = state.matchmaker.dashboard(&user_id, &target_user_id).await?;
    Ok(HttpResponse::Ok().json(assessment))
}
