//! HTTP handlers for the image pipeline endpoints.
//!
//! Three endpoints, all JSON in/out:
//! - `POST /process_images` — two-stage transcribe + elaborate; mutates and
//!   broadcasts shared state.
//! - `POST /transcribe_images` — single-stage transcription only.
//! - `POST /analyze_theme` — classify an existing transcript against the
//!   curriculum-theme taxonomy.
//!
//! Input validation (empty image list, empty transcript) lives in the
//! pipeline so the HTTP layer stays a thin translation of request/response
//! shapes.

use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ImagesRequest {
    /// Base64-encoded image payloads, in presentation order.
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeThemeRequest {
    #[serde(default)]
    pub transcript: Option<String>,
}

pub async fn process_images(
    state: web::Data<AppState>,
    body: web::Json<ImagesRequest>,
) -> Result<HttpResponse, AppError> {
    let images = body.images.as_deref().unwrap_or(&[]);
    let outcome = state.pipeline.transcribe_and_elaborate(images).await?;

    Ok(HttpResponse::Ok().json(json!({
        "initialTranscript": outcome.initial_transcript,
        "finalResponse": outcome.final_response,
    })))
}

pub async fn transcribe_images(
    state: web::Data<AppState>,
    body: web::Json<ImagesRequest>,
) -> Result<HttpResponse, AppError> {
    let images = body.images.as_deref().unwrap_or(&[]);
    let transcript = state.pipeline.transcribe(images).await?;

    Ok(HttpResponse::Ok().json(json!({
        "transcript": transcript,
    })))
}

pub async fn analyze_theme(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeThemeRequest>,
) -> Result<HttpResponse, AppError> {
    let transcript = body.transcript.as_deref().unwrap_or("");
    let analyzed_theme = state.pipeline.classify_theme(transcript).await?;

    Ok(HttpResponse::Ok().json(json!({
        "analyzedTheme": analyzed_theme,
    })))
}
