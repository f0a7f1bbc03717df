// src/api/handlers/predict.rs
use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::api::AppState;
use crate::collector::{InputSurface, SurfaceKind};
use crate::errors::PredictError;
use crate::models::DisplayModel;
use crate::render::RenderedView;
use crate::session::Submission;

/// What the page sends on submit. Only the part matching the mounted surface is read.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub rows: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub id: String,
    pub submitted_at: String,
    pub latency_ms: Option<u64>,
    pub model: DisplayModel,
    pub view: RenderedView,
}

impl From<Submission> for PredictResponse {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id.to_string(),
            submitted_at: submission.submitted_at.to_rfc3339(),
            latency_ms: submission.latency_ms,
            view: RenderedView::from(&submission.model),
            model: submission.model,
        }
    }
}

/// A submission refused because another one is pending leaves the row buffer
/// as it was: the busy check runs before the page's values are stored.
pub async fn predict(
    state: web::Data<AppState>,
    req: web::Json<PredictRequest>,
) -> Result<HttpResponse> {
    if state.session.is_busy() {
        log::warn!("Submission refused: a prediction is already in progress");
        return Ok(error_response(PredictError::SubmissionInFlight));
    }

    let req = req.into_inner();

    let (rows, surface) = match state.config.form.surface {
        kind @ (SurfaceKind::NumericGrid | SurfaceKind::CsvGrid) => {
            let mut buffer = state.buffer.write().await;
            if let Some(values) = req.rows {
                buffer.set_values(values);
            }
            let surface = if kind == SurfaceKind::NumericGrid {
                InputSurface::NumericGrid
            } else {
                InputSurface::CsvGrid
            };
            (buffer.rows().to_vec(), surface)
        }
        SurfaceKind::TextArea => (Vec::new(), InputSurface::TextArea(req.text.unwrap_or_default())),
        SurfaceKind::Form => (Vec::new(), InputSurface::Form(req.fields.unwrap_or_default())),
    };

    match state.session.submit(&rows, &surface).await {
        Ok(submission) => Ok(HttpResponse::Ok().json(PredictResponse::from(submission))),
        Err(e) => Ok(error_response(e)),
    }
}

fn error_response(e: PredictError) -> HttpResponse {
    let body = json!({ "error": e.user_message() });
    match e {
        PredictError::EmptyInput | PredictError::Encode(_) => HttpResponse::BadRequest().json(body),
        PredictError::SubmissionInFlight => HttpResponse::Conflict().json(body),
        _ => {
            log::error!("Submission failed: {:?}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

pub async fn get_result(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(match state.view.latest() {
        Some(view) => HttpResponse::Ok().json(view),
        None => HttpResponse::NoContent().finish(),
    })
}
