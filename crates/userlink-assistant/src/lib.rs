//! # userlink-assistant
//!
//! Client for the remote assistant service (OpenAI Assistants v2 wire
//! format). The [`AssistantApi`] trait is the seam the chat orchestrator
//! depends on; [`OpenAiClient`] implements it with `reqwest`.

pub mod client;
pub mod types;

mod error;

pub use client::{AssistantApi, OpenAiClient, DEFAULT_BASE_URL};
pub use error::{AssistantError, Result};
pub use types::*;
