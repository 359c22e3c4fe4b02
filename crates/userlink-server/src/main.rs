//! # userlink-server
//!
//! HTTP backend for the UserLink chat application.
//!
//! This binary provides:
//! - **REST API** (axum) over the flat JSON document: list with filters,
//!   get, create, replace, merge and delete on any collection
//! - **Chat orchestration** that pairs each user with a remote assistant,
//!   relays questions, uploads files for retrieval and cascades deletes
//! - **Health and banner endpoints** for probes and discovery

mod api;
mod config;
mod error;
#[cfg(test)]
mod mock_api;
mod orchestrator;
mod preview;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use userlink_assistant::{AssistantApi, OpenAiClient};
use userlink_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::orchestrator::ChatService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,userlink_server=debug")),
        )
        .init();

    info!("Starting UserLink server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Flat JSON document (created with empty collections if missing)
    let db = Arc::new(Database::open_at(&config.db_path).await?);
    info!(path = %config.db_path.display(), "Opened datastore");

    let client = OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    );
    if !client.has_api_key() {
        warn!("OPENAI_API_KEY is not set; chat endpoints will answer 503");
    }
    let api: Arc<dyn AssistantApi> = Arc::new(client);

    let chat = Arc::new(ChatService::new(
        db.clone(),
        api,
        config.assistant_model.clone(),
        config.run_poll_interval,
    ));

    let http_addr = config.http_addr;
    let app_state = AppState {
        db,
        chat,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
