// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::collector::{RowBuffer, SurfaceKind};
use crate::errors::{PredictError, Result};

/// Feature columns of the prediction form, in the order the model expects.
pub const DEFAULT_COLUMNS: [&str; 8] = ["Glu", "FIB", "AST.ALT", "AG", "Age", "BMI", "NC", "Mallampati"];

/// Values the first row is pre-filled with.
pub const DEFAULT_VALUES: [&str; 8] = ["4.22", "1.71", "0.74", "17.8", "21", "23.4", "43", "1"];

/// Where the prediction backend lives.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub predict_path: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            predict_path: "/predict".to_string(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn predict_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.predict_path.trim_start_matches('/')
        )
    }
}

/// Shape of the input form.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    pub surface: SurfaceKind,
    pub columns: Vec<String>,
    pub defaults: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceKind::NumericGrid,
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            defaults: DEFAULT_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl FormConfig {
    pub fn row_buffer(&self) -> RowBuffer {
        RowBuffer::new(self.columns.clone(), self.defaults.clone())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request bodies accepted from the page.
    pub max_payload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_payload_bytes: 16 * 1024 * 1024,
        }
    }
}

/// High-level application configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub form: FormConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Defaults, then the config file if one is found, then environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with(env_var)
    }

    /// Same as [`AppConfig::load`] with variables read through `lookup`.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match config_path(&lookup) {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(env_var)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `PREDICT_*` overrides, reading each variable through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("PREDICT_BACKEND_URL") {
            self.backend.base_url = url.trim().to_string();
        }
        if let Some(path) = lookup("PREDICT_PATH") {
            self.backend.predict_path = path.trim().to_string();
        }
        if let Some(secs) = lookup("PREDICT_TIMEOUT_SECS") {
            self.backend.timeout_secs = secs.trim().parse().map_err(|_| {
                PredictError::Config(format!("PREDICT_TIMEOUT_SECS must be a number, got '{}'", secs))
            })?;
        }
        if let Some(surface) = lookup("PREDICT_SURFACE") {
            self.form.surface = parse_surface(&surface)?;
        }
        if let Some(host) = lookup("PREDICT_HOST") {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PREDICT_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                PredictError::Config(format!("PREDICT_PORT must be a port number, got '{}'", port))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(PredictError::Config("backend.base_url must not be empty".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(PredictError::Config("backend.timeout_secs must be at least 1".to_string()));
        }
        if self.form.defaults.len() != self.form.columns.len() {
            return Err(PredictError::Config(format!(
                "form.defaults has {} values but form.columns has {}",
                self.form.defaults.len(),
                self.form.columns.len()
            )));
        }
        Ok(())
    }
}

fn parse_surface(value: &str) -> Result<SurfaceKind> {
    let quoted = format!("\"{}\"", value.trim());
    serde_json::from_str(&quoted)
        .map_err(|_| PredictError::Config(format!("Unknown input surface '{}'", value.trim())))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// `PREDICT_CONFIG` if set, else the per-user config file when it exists.
fn config_path(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(path) = lookup("PREDICT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("predict-console").join("config.toml"))
        .filter(|path| path.exists())
}
