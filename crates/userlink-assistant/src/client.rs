//! The [`AssistantApi`] seam and its HTTP implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AssistantError, Result};
use crate::types::{
    AssistantSpec, Attachment, ErrorEnvelope, ListResponse, MessageRole, NewRun, NewThreadMessage,
    RemoteAssistant, Run, Thread, ThreadMessage, Tool, UploadedFile,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Remote assistant operations used by the chat orchestrator.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<RemoteAssistant>;

    /// Make sure the assistant can search attached files.
    async fn enable_file_search(&self, assistant_id: &str) -> Result<()>;

    async fn delete_assistant(&self, assistant_id: &str) -> Result<()>;

    async fn create_thread(&self) -> Result<Thread>;

    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Post a user message, optionally attaching an uploaded file for
    /// file search.
    async fn post_message(
        &self,
        thread_id: &str,
        content: &str,
        attachment: Option<&str>,
    ) -> Result<ThreadMessage>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Messages on the thread, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;

    async fn upload_file(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<UploadedFile>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;
}

/// [`AssistantApi`] over the OpenAI REST endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Deserialize)]
struct Deleted {
    #[serde(default)]
    deleted: bool,
}

#[derive(Serialize)]
struct ToolsUpdate {
    tools: Vec<Tool>,
}

impl OpenAiClient {
    /// A missing key is not an error here; every call fails with
    /// [`AssistantError::MissingApiKey`] instead.
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let api_key = self.api_key.as_ref().ok_or(AssistantError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%method, %url, "assistant API request");
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(api_key)
            .header("OpenAI-Beta", "assistants=v2"))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(status = status.as_u16(), error = %message, "assistant API error");
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.send(self.request(Method::GET, endpoint)?).await
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, endpoint)?.json(body))
            .await
    }

    async fn delete(&self, endpoint: &str) -> Result<()> {
        let deleted: Deleted = self.send(self.request(Method::DELETE, endpoint)?).await?;
        if !deleted.deleted {
            warn!(endpoint, "assistant API reported deleted=false");
        }
        Ok(())
    }
}

#[async_trait]
impl AssistantApi for OpenAiClient {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<RemoteAssistant> {
        self.post("assistants", spec).await
    }

    async fn enable_file_search(&self, assistant_id: &str) -> Result<()> {
        let update = ToolsUpdate {
            tools: vec![Tool::file_search()],
        };
        let _: RemoteAssistant = self
            .post(&format!("assistants/{assistant_id}"), &update)
            .await?;
        Ok(())
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<()> {
        self.delete(&format!("assistants/{assistant_id}")).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.post("threads", &serde_json::json!({})).await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.delete(&format!("threads/{thread_id}")).await
    }

    async fn post_message(
        &self,
        thread_id: &str,
        content: &str,
        attachment: Option<&str>,
    ) -> Result<ThreadMessage> {
        let body = NewThreadMessage {
            role: MessageRole::User,
            content,
            attachments: attachment
                .map(|file_id| Attachment {
                    file_id,
                    tools: vec![Tool::file_search()],
                })
                .into_iter()
                .collect(),
        };
        self.post(&format!("threads/{thread_id}/messages"), &body)
            .await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let body = NewRun {
            assistant_id,
            tools: vec![Tool::file_search()],
        };
        self.post(&format!("threads/{thread_id}/runs"), &body)
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get(&format!("threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let list: ListResponse<ThreadMessage> =
            self.get(&format!("threads/{thread_id}/messages")).await?;
        if list.has_more {
            debug!(thread = %thread_id, "only the newest page of messages was fetched");
        }
        Ok(list.data)
    }

    async fn upload_file(&self, name: &str, mime_type: &str, data: Vec<u8>) -> Result<UploadedFile> {
        let part = Part::bytes(data)
            .file_name(name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().text("purpose", "assistants").part("file", part);
        let builder = self.request(Method::POST, "files")?.multipart(form);
        self.send(builder).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.delete(&format!("files/{file_id}")).await
    }
}
