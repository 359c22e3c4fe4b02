//! Chat orchestration over the flat store and the remote assistant service.
//!
//! Each operation is a fixed sequence of local and remote steps. Nothing is
//! compensated: a failure part-way through leaves whatever was already
//! written in place, and callers retry the whole operation if they want to.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};
use userlink_assistant::{AssistantApi, AssistantSpec, MessageRole, Run, RunStatus};
use userlink_store::{
    Assistant, Database, FileRecord, Message, NewAssistant, NewFile, Role, User,
};

use crate::error::ServerError;
use crate::preview::{self, FilePreview};

/// A file received from a client, ready to forward to the assistant.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Outcome of a user deletion cascade.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub user: User,
    pub files_removed: usize,
    pub assistants_removed: usize,
    pub messages_removed: usize,
    /// Remote deletions that failed and were skipped.
    pub remote_failures: usize,
}

pub struct ChatService {
    db: Arc<Database>,
    api: Arc<dyn AssistantApi>,
    model: String,
    poll_interval: Duration,
}

impl ChatService {
    pub fn new(
        db: Arc<Database>,
        api: Arc<dyn AssistantApi>,
        model: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            db,
            api,
            model: model.into(),
            poll_interval,
        }
    }

    /// Create a user together with a remote assistant and thread.
    pub async fn create_user_with_assistant(&self, name: &str) -> Result<User, ServerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServerError::BadRequest("name must not be empty".into()));
        }

        let user = self.db.insert_user(name, None).await?;
        let spec = AssistantSpec::personal(name, &self.model);
        let remote = self.api.create_assistant(&spec).await?;
        let thread = self.api.create_thread().await?;

        let assistant = self
            .db
            .insert_assistant(&NewAssistant {
                user_id: user.id.clone(),
                openai_assistant_id: remote.id,
                name: spec.name,
                thread_id: Some(thread.id),
            })
            .await?;
        let user = self.db.set_user_assistant(&user.id, &assistant.id).await?;

        info!(user = %user.id, assistant = %assistant.id, "created user with assistant");
        Ok(user)
    }

    /// Ask the user's assistant a question and persist both sides of the
    /// exchange.
    ///
    /// Waits for the remote run without any upper bound.
    pub async fn ask_question(&self, user_id: &str, question: &str) -> Result<Message, ServerError> {
        if question.trim().is_empty() {
            return Err(ServerError::BadRequest("question must not be empty".into()));
        }

        let user = self.db.get_user(user_id).await?;
        let assistant = self.require_assistant(&user.id).await?;
        let thread_id = self.ensure_thread(&assistant).await?;

        self.db
            .insert_message(&thread_id, Role::User, question)
            .await?;
        self.api.post_message(&thread_id, question, None).await?;

        let run = self
            .api
            .create_run(&thread_id, &assistant.openai_assistant_id)
            .await?;
        debug!(user = %user.id, thread = %thread_id, run = %run.id, "started assistant run");
        self.wait_for_run(&thread_id, &run.id).await?;

        let remote_messages = self.api.list_messages(&thread_id).await?;
        let reply = remote_messages
            .iter()
            .find(|m| m.role == MessageRole::Assistant)
            .ok_or(ServerError::NoReply)?;
        let content = reply.first_text().unwrap_or_default();

        let message = self
            .db
            .insert_message(&thread_id, Role::Assistant, content)
            .await?;
        info!(user = %user.id, thread = %thread_id, "stored assistant reply");
        Ok(message)
    }

    /// Poll until the run completes or fails. There is no timeout.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ServerError> {
        let mut polls: u64 = 0;
        loop {
            let run = self.api.get_run(thread_id, run_id).await?;
            polls += 1;
            match run.status {
                RunStatus::Completed => {
                    debug!(run = %run_id, polls, "assistant run completed");
                    return Ok(run);
                }
                status if status.is_failure() => {
                    let (code, reason) = run
                        .last_error
                        .map(|e| (e.code, e.message))
                        .unwrap_or_default();
                    warn!(run = %run_id, ?status, %code, %reason, "assistant run failed");
                    return Err(ServerError::RunFailed);
                }
                status => {
                    tracing::trace!(run = %run_id, ?status, polls, "assistant run pending");
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Upload a file to the user's assistant and record it locally.
    pub async fn upload_file(&self, user_id: &str, upload: Upload) -> Result<FileRecord, ServerError> {
        let user = self.db.get_user(user_id).await?;
        let assistant = self.require_assistant(&user.id).await?;

        let size = upload.data.len() as u64;
        let remote = self
            .api
            .upload_file(&upload.name, &upload.mime_type, upload.data)
            .await?;
        self.api
            .enable_file_search(&assistant.openai_assistant_id)
            .await?;

        let thread_id = self.ensure_thread(&assistant).await?;
        let note = format!("I'm uploading {} for future reference.", upload.name);
        self.api
            .post_message(&thread_id, &note, Some(&remote.id))
            .await?;

        let file = self
            .db
            .insert_file(&NewFile {
                user_id: user.id.clone(),
                name: upload.name,
                size,
                mime_type: upload.mime_type,
                openai_file_id: remote.id,
                assistant_id: assistant.id.clone(),
            })
            .await?;
        info!(user = %user.id, file = %file.id, size, "uploaded file to assistant");
        Ok(file)
    }

    pub async fn user_files(&self, user_id: &str) -> Result<Vec<FileRecord>, ServerError> {
        Ok(self.db.files_for_user(user_id).await?)
    }

    /// Chat history on the user's thread, oldest first.
    pub async fn user_messages(&self, user_id: &str) -> Result<Vec<Message>, ServerError> {
        let Some(assistant) = self.db.assistant_for_user(user_id).await? else {
            return Ok(Vec::new());
        };
        let Some(thread_id) = assistant.thread_id else {
            return Ok(Vec::new());
        };
        Ok(self.db.messages_for_thread(&thread_id).await?)
    }

    /// Delete a user and everything hanging off it.
    ///
    /// Remote deletions are best-effort: failures are logged and counted,
    /// and the local cascade carries on regardless.
    pub async fn delete_user(&self, user_id: &str) -> Result<DeletionReport, ServerError> {
        self.db.get_user(user_id).await?;
        let assistants = self.db.assistants_for_user(user_id).await?;
        let files = self.db.files_for_user(user_id).await?;

        let mut remote_failures = 0;

        let outcomes = join_all(files.iter().map(|file| self.remove_file(file))).await;
        let mut files_removed = 0;
        for outcome in outcomes {
            let remote_ok = outcome?;
            files_removed += 1;
            if !remote_ok {
                remote_failures += 1;
            }
        }

        let mut messages_removed = 0;
        for assistant in &assistants {
            if let Err(e) = self
                .api
                .delete_assistant(&assistant.openai_assistant_id)
                .await
            {
                warn!(assistant = %assistant.openai_assistant_id, error = %e, "failed to delete remote assistant");
                remote_failures += 1;
            }
            self.db.delete_assistant(&assistant.id).await?;

            if let Some(thread_id) = &assistant.thread_id {
                if let Err(e) = self.api.delete_thread(thread_id).await {
                    warn!(thread = %thread_id, error = %e, "failed to delete remote thread");
                    remote_failures += 1;
                }
                messages_removed += self.db.delete_thread_messages(thread_id).await?;
            }
        }

        let user = self.db.delete_user(user_id).await?;
        info!(
            user = %user.id,
            files_removed,
            assistants_removed = assistants.len(),
            messages_removed,
            remote_failures,
            "deleted user"
        );

        Ok(DeletionReport {
            user,
            files_removed,
            assistants_removed: assistants.len(),
            messages_removed,
            remote_failures,
        })
    }

    /// Delete one file remotely (best-effort) and locally.
    pub async fn delete_file(&self, file_id: &str) -> Result<FileRecord, ServerError> {
        let file = self.db.get_file(file_id).await?;
        self.remove_file(&file).await?;
        Ok(file)
    }

    pub async fn file_preview(&self, file_id: &str) -> Result<FilePreview, ServerError> {
        let file = self.db.get_file(file_id).await?;
        Ok(preview::describe(&file))
    }

    /// Returns whether the remote deletion succeeded.
    async fn remove_file(&self, file: &FileRecord) -> Result<bool, ServerError> {
        let remote_ok = match self.api.delete_file(&file.openai_file_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(file = %file.id, remote = %file.openai_file_id, error = %e, "failed to delete remote file");
                false
            }
        };
        self.db.delete_file(&file.id).await?;
        Ok(remote_ok)
    }

    async fn require_assistant(&self, user_id: &str) -> Result<Assistant, ServerError> {
        self.db
            .assistant_for_user(user_id)
            .await?
            .ok_or_else(|| ServerError::NotFound("Assistant not found for this user".into()))
    }

    /// The assistant's thread, created and recorded on first use.
    async fn ensure_thread(&self, assistant: &Assistant) -> Result<String, ServerError> {
        if let Some(thread_id) = &assistant.thread_id {
            return Ok(thread_id.clone());
        }
        let thread = self.api.create_thread().await?;
        self.db
            .set_assistant_thread(&assistant.id, &thread.id)
            .await?;
        debug!(assistant = %assistant.id, thread = %thread.id, "created thread");
        Ok(thread.id)
    }
}
