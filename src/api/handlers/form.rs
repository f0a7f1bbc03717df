// src/api/handlers/form.rs
use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::collector::{RowBuffer, SurfaceKind};

#[derive(Serialize)]
pub struct FormResponse {
    pub surface: SurfaceKind,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FormResponse {
    fn new(surface: SurfaceKind, buffer: &RowBuffer) -> Self {
        Self {
            surface,
            columns: buffer.columns().to_vec(),
            rows: buffer.rows().iter().map(|r| r.cells.clone()).collect(),
        }
    }
}

/// Cell values shown in the page when a row button was pressed. Applied to
/// the buffer before the row change so unsaved edits survive the redraw.
#[derive(Debug, Default, Deserialize)]
pub struct RowsSync {
    pub rows: Option<Vec<Vec<String>>>,
}

impl RowsSync {
    fn apply(body: Option<web::Json<RowsSync>>, buffer: &mut RowBuffer) {
        if let Some(rows) = body.and_then(|b| b.into_inner().rows) {
            buffer.set_values(rows);
        }
    }
}

pub async fn get_form(state: web::Data<AppState>) -> Result<HttpResponse> {
    let buffer = state.buffer.read().await;
    Ok(HttpResponse::Ok().json(FormResponse::new(state.config.form.surface, &buffer)))
}

pub async fn add_row(
    state: web::Data<AppState>,
    body: Option<web::Json<RowsSync>>,
) -> Result<HttpResponse> {
    let mut buffer = state.buffer.write().await;
    RowsSync::apply(body, &mut buffer);
    buffer.add_row();
    log::debug!("Row added, {} row(s) now", buffer.len());
    Ok(HttpResponse::Ok().json(FormResponse::new(state.config.form.surface, &buffer)))
}

/// Removing the last remaining row is a no-op, not an error.
pub async fn remove_row(
    state: web::Data<AppState>,
    path: web::Path<usize>,
    body: Option<web::Json<RowsSync>>,
) -> Result<HttpResponse> {
    let index = path.into_inner();
    let mut buffer = state.buffer.write().await;
    RowsSync::apply(body, &mut buffer);
    if !buffer.remove_row(index) {
        log::debug!("Row {} kept, {} row(s) in buffer", index, buffer.len());
    }
    Ok(HttpResponse::Ok().json(FormResponse::new(state.config.form.surface, &buffer)))
}
