//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. Without `OPENAI_API_KEY` the REST
//! store still works; chat operations fail with a configuration error.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use userlink_assistant::DEFAULT_BASE_URL;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`, or `PORT` alone to change only the port.
    /// Default: `0.0.0.0:3002`
    pub http_addr: SocketAddr,

    /// Path of the JSON document holding every collection.
    /// Env: `DB_PATH`
    /// Default: `./db.json`
    pub db_path: PathBuf,

    /// Bearer credential for the assistant service.
    /// Env: `OPENAI_API_KEY`
    /// Default: unset (chat endpoints answer 503).
    pub openai_api_key: Option<String>,

    /// Env: `OPENAI_BASE_URL`
    /// Default: `https://api.openai.com/v1`
    pub openai_base_url: String,

    /// Model used for newly created assistants.
    /// Env: `ASSISTANT_MODEL`
    /// Default: `gpt-4o`
    pub assistant_model: String,

    /// Delay between run-status polls.
    /// Env: `RUN_POLL_INTERVAL_MS`
    /// Default: `1000`
    pub run_poll_interval: Duration,

    /// Largest accepted file upload in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 20 MiB
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 3002).into(),
            db_path: PathBuf::from("./db.json"),
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            assistant_model: "gpt-4o".to_string(),
            run_poll_interval: Duration::from_millis(1000),
            max_upload_size: 20 * 1024 * 1024, // 20 MiB
        }
    }
}

// Keeps the API key out of `?config` log lines.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("db_path", &self.db_path)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("assistant_model", &self.assistant_model)
            .field("run_poll_interval", &self.run_poll_interval)
            .field("max_upload_size", &self.max_upload_size)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.http_addr.set_port(port),
                Err(_) => tracing::warn!(value = %port, "Invalid PORT, using default"),
            }
        }

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Some(path) = lookup("DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(key) = lookup("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.openai_api_key = Some(key.trim().to_string());
            }
        }

        if let Some(url) = lookup("OPENAI_BASE_URL") {
            if !url.is_empty() {
                config.openai_base_url = url;
            }
        }

        if let Some(model) = lookup("ASSISTANT_MODEL") {
            if !model.is_empty() {
                config.assistant_model = model;
            }
        }

        if let Some(val) = lookup("RUN_POLL_INTERVAL_MS") {
            match val.parse::<u64>() {
                Ok(ms) if ms > 0 => config.run_poll_interval = Duration::from_millis(ms),
                _ => tracing::warn!(value = %val, "Invalid RUN_POLL_INTERVAL_MS, using default"),
            }
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            match val.trim().parse::<usize>() {
                Ok(n) => config.max_upload_size = n,
                Err(_) => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
