use std::collections::VecDeque;
use std::sync::Mutex;

use userlink_assistant::{
    AssistantApi, AssistantError, AssistantSpec, ContentPart, MessageRole, RemoteAssistant, Run,
    RunStatus, TextContent, Thread, ThreadMessage, UploadedFile,
};

/// In-process stand-in for the remote assistant service.
///
/// Run statuses are served from a script; once it runs dry every poll
/// reports `final_status`.
pub(crate) struct ScriptedApi {
    state: Mutex<ScriptState>,
}

#[derive(Default)]
pub(crate) struct ScriptState {
    pub next_id: u32,
    pub statuses: VecDeque<RunStatus>,
    pub final_status: Option<RunStatus>,
    pub reply: Option<String>,
    pub fail_deletes: bool,
    pub created_threads: Vec<String>,
    pub posted: Vec<(String, String, Option<String>)>,
    pub polls: u32,
    pub file_search_enabled: Vec<String>,
    pub deleted: Vec<String>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                final_status: Some(RunStatus::Completed),
                reply: Some("Hello from the assistant".to_string()),
                ..ScriptState::default()
            }),
        }
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        self.state.lock().unwrap().statuses = statuses.into_iter().collect();
        self
    }

    pub fn stuck(self) -> Self {
        self.state.lock().unwrap().final_status = Some(RunStatus::InProgress);
        self
    }

    pub fn without_reply(self) -> Self {
        self.state.lock().unwrap().reply = None;
        self
    }

    pub fn failing_deletes(self) -> Self {
        self.state.lock().unwrap().fail_deletes = true;
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap()
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.state();
        state.next_id += 1;
        format!("{prefix}_{}", state.next_id)
    }

    fn record_delete(&self, id: &str) -> userlink_assistant::Result<()> {
        let mut state = self.state();
        if state.fail_deletes {
            return Err(AssistantError::Api {
                status: 500,
                message: format!("could not delete {id}"),
            });
        }
        state.deleted.push(id.to_string());
        Ok(())
    }
}

fn text_message(id: String, role: MessageRole, text: &str) -> ThreadMessage {
    ThreadMessage {
        id,
        role,
        content: vec![ContentPart {
            kind: "text".to_string(),
            text: Some(TextContent {
                value: text.to_string(),
            }),
        }],
    }
}

#[async_trait::async_trait]
impl AssistantApi for ScriptedApi {
    async fn create_assistant(
        &self,
        _spec: &AssistantSpec,
    ) -> userlink_assistant::Result<RemoteAssistant> {
        Ok(RemoteAssistant {
            id: self.next_id("asst"),
        })
    }

    async fn enable_file_search(&self, assistant_id: &str) -> userlink_assistant::Result<()> {
        self.state()
            .file_search_enabled
            .push(assistant_id.to_string());
        Ok(())
    }

    async fn delete_assistant(&self, assistant_id: &str) -> userlink_assistant::Result<()> {
        self.record_delete(assistant_id)
    }

    async fn create_thread(&self) -> userlink_assistant::Result<Thread> {
        let id = self.next_id("thread");
        self.state().created_threads.push(id.clone());
        Ok(Thread { id })
    }

    async fn delete_thread(&self, thread_id: &str) -> userlink_assistant::Result<()> {
        self.record_delete(thread_id)
    }

    async fn post_message(
        &self,
        thread_id: &str,
        content: &str,
        attachment: Option<&str>,
    ) -> userlink_assistant::Result<ThreadMessage> {
        let id = self.next_id("msg");
        self.state().posted.push((
            thread_id.to_string(),
            content.to_string(),
            attachment.map(str::to_string),
        ));
        Ok(text_message(id, MessageRole::User, content))
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
    ) -> userlink_assistant::Result<Run> {
        Ok(Run {
            id: self.next_id("run"),
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn get_run(&self, _thread_id: &str, run_id: &str) -> userlink_assistant::Result<Run> {
        let mut state = self.state();
        state.polls += 1;
        let status = match state.statuses.pop_front() {
            Some(status) => status,
            None => state.final_status.unwrap_or(RunStatus::Completed),
        };
        Ok(Run {
            id: run_id.to_string(),
            status,
            last_error: None,
        })
    }

    async fn list_messages(&self, thread_id: &str) -> userlink_assistant::Result<Vec<ThreadMessage>> {
        let state = self.state();
        let mut messages: Vec<ThreadMessage> = state
            .posted
            .iter()
            .filter(|(thread, _, _)| thread == thread_id)
            .enumerate()
            .map(|(i, (_, content, _))| text_message(format!("user_{i}"), MessageRole::User, content))
            .collect();
        if let Some(reply) = &state.reply {
            messages.push(text_message("older_reply".into(), MessageRole::Assistant, "stale"));
            messages.push(text_message("reply".into(), MessageRole::Assistant, reply));
        }
        // Newest first, like the remote service.
        messages.reverse();
        Ok(messages)
    }

    async fn upload_file(
        &self,
        _name: &str,
        _mime_type: &str,
        _data: Vec<u8>,
    ) -> userlink_assistant::Result<UploadedFile> {
        Ok(UploadedFile {
            id: self.next_id("file"),
        })
    }

    async fn delete_file(&self, file_id: &str) -> userlink_assistant::Result<()> {
        self.record_delete(file_id)
    }
}
