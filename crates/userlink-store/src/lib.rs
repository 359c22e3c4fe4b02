//! # userlink-store
//!
//! Flat-file JSON datastore for the UserLink chat backend.
//!
//! One JSON document holds a top-level array per collection (`users`,
//! `assistants`, `files`, `chat_threads`, `messages`). The crate exposes an
//! async [`Database`] handle with generic CRUD-by-filter operations used by
//! the REST surface, plus typed helpers for each domain model used by the
//! chat orchestrator.

pub mod assistants;
pub mod database;
pub mod files;
pub mod messages;
pub mod models;
pub mod query;
pub mod users;

mod error;

pub use database::{timestamp, Database};
pub use error::{Result, StoreError};
pub use models::*;
pub use query::{Query, SortOrder};
