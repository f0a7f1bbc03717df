// src/transport/http.rs

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::config::BackendConfig;
use crate::errors::{PredictError, Result};
use crate::models::{EncodedPayload, RawResult};
use crate::transport::PredictionTransport;

/// Talks to the prediction backend over HTTP.
pub struct HttpTransport {
    client: Client,
    config: BackendConfig,
}

impl HttpTransport {
    /// Creates a transport whose client enforces the configured timeout.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: Client, config: BackendConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, url: &str, payload: &EncodedPayload) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match payload {
            EncodedPayload::NumericMatrix(rows) => builder.json(&json!({ "data": rows })),
            EncodedPayload::DelimitedText(text) => {
                let form = reqwest::multipart::Form::new().text("data", text.clone());
                builder.multipart(form)
            }
            EncodedPayload::FieldMap(fields) => builder.json(fields),
        }
    }
}

#[async_trait]
impl PredictionTransport for HttpTransport {
    async fn predict(&self, payload: &EncodedPayload) -> Result<(RawResult, u64)> {
        if payload.is_empty() {
            return Err(PredictError::EmptyInput);
        }

        let url = self.config.predict_url();
        log::info!("📡 Calling backend: {} with {} row(s)", url, payload.row_count());

        let start = Instant::now();
        let resp = self.request(&url, payload).send().await?;

        let status = resp.status();
        let latency_ms = start.elapsed().as_millis() as u64;
        log::info!("📥 Backend response status: {} ({}ms)", status, latency_ms);

        let body = resp.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            log::warn!("Backend rejected the request: {}", message);
            return Err(PredictError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|_| PredictError::UnexpectedResponse(snippet(&body)))?;
        let raw = RawResult::from(value);

        if let Some(error) = &raw.error {
            log::warn!("Backend returned an error: {}", error);
            if let Some(traceback) = &raw.traceback {
                log::debug!("Backend traceback:\n{}", traceback);
            }
            return Err(PredictError::Backend(error.clone()));
        }

        Ok((raw, latency_ms))
    }
}

/// The backend's own `error` text when the body carries one, else the body
/// itself, else the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value.get("error") {
            Some(Value::String(message)) => return message.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!(
            "Backend returned {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()
    } else {
        format!("Backend returned {}: {}", status.as_u16(), snippet(body))
    }
}

fn snippet(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}
