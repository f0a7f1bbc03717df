// src/api/handlers/mod.rs
mod health;
mod form;
mod predict;

pub use health::health_check;
pub use form::{get_form, add_row, remove_row, FormResponse, RowsSync};
pub use predict::{predict, get_result, PredictRequest, PredictResponse};
