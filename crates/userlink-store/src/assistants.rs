use serde_json::json;

use crate::database::{decode, decode_all, Database};
use crate::error::Result;
use crate::models::{Assistant, NewAssistant, ASSISTANTS};
use crate::query::Query;

impl Database {
    pub async fn insert_assistant(&self, assistant: &NewAssistant) -> Result<Assistant> {
        let body = serde_json::to_value(assistant)?;
        decode(self.create(ASSISTANTS, body).await?)
    }

    pub async fn assistants_for_user(&self, user_id: &str) -> Result<Vec<Assistant>> {
        let query = Query::new().filter("userId", user_id);
        decode_all(self.list(ASSISTANTS, &query).await?)
    }

    /// The user's assistant. Users own at most one, so the first match wins.
    pub async fn assistant_for_user(&self, user_id: &str) -> Result<Option<Assistant>> {
        Ok(self.assistants_for_user(user_id).await?.into_iter().next())
    }

    pub async fn set_assistant_thread(&self, id: &str, thread_id: &str) -> Result<Assistant> {
        let patch = json!({ "threadId": thread_id });
        decode(self.merge(ASSISTANTS, id, patch).await?)
    }

    pub async fn delete_assistant(&self, id: &str) -> Result<Assistant> {
        decode(self.delete(ASSISTANTS, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_assistant(user_id: &str) -> NewAssistant {
        NewAssistant {
            user_id: user_id.to_string(),
            openai_assistant_id: "asst_1".to_string(),
            name: "Ada's Assistant".to_string(),
            thread_id: None,
        }
    }

    #[tokio::test]
    async fn lookup_by_user() {
        let db = Database::in_memory();
        let created = db.insert_assistant(&new_assistant("u1")).await.unwrap();
        db.insert_assistant(&new_assistant("u2")).await.unwrap();

        let found = db.assistant_for_user("u1").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(db.assistant_for_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn thread_is_recorded() {
        let db = Database::in_memory();
        let created = db.insert_assistant(&new_assistant("u1")).await.unwrap();
        assert!(created.thread_id.is_none());

        let updated = db.set_assistant_thread(&created.id, "thread_9").await.unwrap();
        assert_eq!(updated.thread_id.as_deref(), Some("thread_9"));
        assert_eq!(updated.openai_assistant_id, "asst_1");
    }
}
