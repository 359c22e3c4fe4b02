//! Wire types for the Assistants v2 API.
//!
//! Only the fields the chat backend reads are modelled; everything else in
//! the remote payloads is ignored on decode.

use serde::{Deserialize, Serialize};

/// A tool enabled on an assistant or a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Tool {
    pub fn file_search() -> Self {
        Self {
            kind: "file_search".to_string(),
        }
    }
}

/// Parameters for creating a remote assistant.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<Tool>,
}

impl AssistantSpec {
    /// The personal assistant created for every new user.
    pub fn personal(user_name: &str, model: &str) -> Self {
        Self {
            name: format!("{user_name}'s Assistant"),
            instructions: format!(
                "You are a personal assistant for {user_name}. Use the knowledge from attached \
                 files to provide accurate and helpful responses."
            ),
            model: model.to_string(),
            tools: vec![Tool::file_search()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RemoteAssistant {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
}

/// Lifecycle of a run. Unrecognised states decode as [`RunStatus::Unknown`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// A run in this state will never complete.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired | RunStatus::Incomplete
        )
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextContent {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

/// A message on a remote thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl ThreadMessage {
    /// Text of the first content part, when that part is text.
    pub fn first_text(&self) -> Option<&str> {
        let part = self.content.first()?;
        if part.kind != "text" {
            return None;
        }
        part.text.as_ref().map(|t| t.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Attachment<'a> {
    pub file_id: &'a str,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewThreadMessage<'a> {
    pub role: MessageRole,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewRun<'a> {
    pub assistant_id: &'a str,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
