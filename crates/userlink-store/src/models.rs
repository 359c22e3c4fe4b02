//! Typed views of the records kept in the flat document.
//!
//! Field names are camelCase on disk so the document stays compatible with
//! the browser client that reads the same collections over REST.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERS: &str = "users";
pub const ASSISTANTS: &str = "assistants";
pub const FILES: &str = "files";
pub const CHAT_THREADS: &str = "chat_threads";
pub const MESSAGES: &str = "messages";

/// Collections present in a freshly created document.
pub const DEFAULT_COLLECTIONS: [&str; 5] = [USERS, ASSISTANTS, FILES, CHAT_THREADS, MESSAGES];

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A chat user. Each user owns at most one assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Local id of the user's [`Assistant`] record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// Local record binding a user to a remote assistant and its thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Assistant {
    pub id: String,
    pub user_id: String,
    /// Identifier of the assistant on the remote service.
    pub openai_assistant_id: String,
    #[serde(default)]
    pub name: String,
    /// Remote conversation thread, created lazily.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating an [`Assistant`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssistant {
    pub user_id: String,
    pub openai_assistant_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// Metadata for a file uploaded to a user's assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub size: u64,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    pub openai_file_id: String,
    pub assistant_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub user_id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub openai_file_id: String,
    pub assistant_id: String,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message on a conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// Remote thread id of the owning assistant.
    pub thread_id: String,
    pub content: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
