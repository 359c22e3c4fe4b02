use crate::database::{decode, decode_all, Database};
use crate::error::Result;
use crate::models::{FileRecord, NewFile, FILES};
use crate::query::Query;

impl Database {
    pub async fn insert_file(&self, file: &NewFile) -> Result<FileRecord> {
        let body = serde_json::to_value(file)?;
        decode(self.create(FILES, body).await?)
    }

    pub async fn get_file(&self, id: &str) -> Result<FileRecord> {
        decode(self.get(FILES, id).await?)
    }

    pub async fn files_for_user(&self, user_id: &str) -> Result<Vec<FileRecord>> {
        let query = Query::new().filter("userId", user_id);
        decode_all(self.list(FILES, &query).await?)
    }

    pub async fn delete_file(&self, id: &str) -> Result<FileRecord> {
        decode(self.delete(FILES, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mime_type_is_stored_as_type() {
        let db = Database::in_memory();
        let file = db
            .insert_file(&NewFile {
                user_id: "u1".into(),
                name: "notes.txt".into(),
                size: 12,
                mime_type: "text/plain".into(),
                openai_file_id: "file_1".into(),
                assistant_id: "a1".into(),
            })
            .await
            .unwrap();

        let raw = db.get(FILES, &file.id).await.unwrap();
        assert_eq!(raw["type"], "text/plain");
        assert_eq!(raw["openaiFileId"], "file_1");

        let listed = db.files_for_user("u1").await.unwrap();
        assert_eq!(listed, vec![file.clone()]);
        assert!(db.files_for_user("u2").await.unwrap().is_empty());

        db.delete_file(&file.id).await.unwrap();
        assert!(db.get_file(&file.id).await.unwrap_err().is_not_found());
    }
}
