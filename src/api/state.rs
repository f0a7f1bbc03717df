// src/api/state.rs
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::collector::RowBuffer;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::render::{ConsoleRenderer, MemoryRenderer, Renderer, Renderers};
use crate::session::PredictionSession;
use crate::transport::{HttpTransport, PredictionTransport};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<PredictionSession>,
    pub buffer: Arc<RwLock<RowBuffer>>,
    pub view: Arc<MemoryRenderer>,
}

impl AppState {
    /// State backed by the HTTP transport from the config.
    pub fn new(config: AppConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.backend.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: AppConfig, transport: Arc<dyn PredictionTransport>) -> Self {
        let view = Arc::new(MemoryRenderer::new());
        let console: Arc<dyn Renderer> = Arc::new(ConsoleRenderer);
        let memory: Arc<dyn Renderer> = view.clone();
        let renderers = Renderers(vec![console, memory]);
        let session = PredictionSession::new(transport, Arc::new(renderers));

        Self {
            buffer: Arc::new(RwLock::new(config.form.row_buffer())),
            config: Arc::new(config),
            session: Arc::new(session),
            view,
        }
    }
}
