//! Durable local document mirror.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::store::{Document, DocumentStore, merge_into};
use crate::Result;

/// Document store persisted in `SQLite`, one JSON body per key.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, key)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a stored document.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the body is not valid JSON.
    pub async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query(r"SELECT body FROM documents WHERE collection = ? AND key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let body: String = row.get("body");
            serde_json::from_str(&body).map_err(Into::into)
        })
        .transpose()
    }

    /// Count documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let row = sqlx::query(r"SELECT COUNT(*) as count FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }
}

impl DocumentStore for SqliteDocumentStore {
    async fn set_merge(&self, collection: &str, key: &str, fields: &Document) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(r"SELECT body FROM documents WHERE collection = ? AND key = ?")
            .bind(collection)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        let mut document = match existing {
            Some(row) => serde_json::from_str::<Document>(&row.get::<String, _>("body"))?,
            None => Document::new(),
        };
        merge_into(&mut document, fields);

        sqlx::query(
            r"
            INSERT INTO documents (collection, key, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection, key) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            ",
        )
        .bind(collection)
        .bind(key)
        .bind(serde_json::to_string(&document)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(collection, key, "Merged document into local mirror");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::MessageRecord;
    use serde_json::json;

    #[tokio::test]
    async fn test_merge_and_retrieve() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();

        let record = MessageRecord::new("42").with_address("555").with_body("hello");
        store
            .set_merge("messages", "42", &record.to_document().unwrap())
            .await
            .unwrap();

        let doc = store.get("messages", "42").await.unwrap().unwrap();
        assert_eq!(doc["address"], json!("555"));
        assert_eq!(doc["body"], json!("hello"));
        assert_eq!(store.count("messages").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_sync_is_idempotent() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();

        let mut record = MessageRecord::new("7").with_body("otp");
        let fields = record.to_document().unwrap();
        store.set_merge("messages", "7", &fields).await.unwrap();
        store.set_merge("messages", "7", &fields).await.unwrap();

        record.read = true;
        store
            .set_merge("messages", "7", &record.to_document().unwrap())
            .await
            .unwrap();

        assert_eq!(store.count("messages").await.unwrap(), 1);
        let doc = store.get("messages", "7").await.unwrap().unwrap();
        assert_eq!(doc["read"], json!(1));
    }

    #[tokio::test]
    async fn test_merge_preserves_foreign_fields() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();

        let mut extra = Document::new();
        extra.insert("label".to_string(), json!("bank"));
        store.set_merge("messages", "1", &extra).await.unwrap();

        let record = MessageRecord::new("1").with_body("statement");
        store
            .set_merge("messages", "1", &record.to_document().unwrap())
            .await
            .unwrap();

        let doc = store.get("messages", "1").await.unwrap().unwrap();
        assert_eq!(doc["label"], json!("bank"));
        assert_eq!(doc["body"], json!("statement"));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let store = SqliteDocumentStore::in_memory().await.unwrap();
        assert!(store.get("messages", "nope").await.unwrap().is_none());
        assert_eq!(store.count("messages").await.unwrap(), 0);
    }
}
