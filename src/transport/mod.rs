// src/transport/mod.rs

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{EncodedPayload, RawResult};

pub mod http;

pub use http::HttpTransport;

/// Sends one encoded submission to the prediction backend.
///
/// Implementations must turn non-2xx statuses and bodies carrying an `error`
/// field into errors, so callers only ever see usable responses in `Ok`.
#[async_trait]
pub trait PredictionTransport: Send + Sync {
    /// Returns the parsed response together with the round-trip latency in milliseconds.
    async fn predict(&self, payload: &EncodedPayload) -> Result<(RawResult, u64)>;
}
