use serde_json::json;

use crate::database::{decode, Database};
use crate::error::Result;
use crate::models::{User, USERS};

impl Database {
    pub async fn insert_user(&self, name: &str, email: Option<&str>) -> Result<User> {
        let mut body = json!({ "name": name });
        if let Some(email) = email {
            body["email"] = json!(email);
        }
        decode(self.create(USERS, body).await?)
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        decode(self.get(USERS, id).await?)
    }

    pub async fn set_user_assistant(&self, user_id: &str, assistant_id: &str) -> Result<User> {
        let patch = json!({ "assistantId": assistant_id });
        decode(self.merge(USERS, user_id, patch).await?)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User> {
        decode(self.delete(USERS, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_link_assistant() {
        let db = Database::in_memory();
        let user = db.insert_user("Ada", None).await.unwrap();
        assert_eq!(user.assistant_id, None);

        let linked = db.set_user_assistant(&user.id, "a1").await.unwrap();
        assert_eq!(linked.assistant_id.as_deref(), Some("a1"));
        assert_eq!(db.get_user(&user.id).await.unwrap(), linked);
    }
}
