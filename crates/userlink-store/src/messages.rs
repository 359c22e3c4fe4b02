use serde_json::json;

use crate::database::{decode, decode_all, Database};
use crate::error::Result;
use crate::models::{Message, Role, MESSAGES};
use crate::query::{Query, SortOrder};

impl Database {
    pub async fn insert_message(&self, thread_id: &str, role: Role, content: &str) -> Result<Message> {
        let body = json!({
            "threadId": thread_id,
            "content": content,
            "role": role.as_str(),
        });
        decode(self.create(MESSAGES, body).await?)
    }

    /// Messages on a thread, oldest first.
    pub async fn messages_for_thread(&self, thread_id: &str) -> Result<Vec<Message>> {
        let query = Query::new()
            .filter("threadId", thread_id)
            .sort_by("createdAt", SortOrder::Asc);
        decode_all(self.list(MESSAGES, &query).await?)
    }

    pub async fn delete_thread_messages(&self, thread_id: &str) -> Result<usize> {
        self.delete_where(MESSAGES, "threadId", thread_id).await
    }
}
