//! `SQLite` implementation of [`ParkReasonStore`].

use sqlx::SqlitePool;

use mowerhub_app::ports::ParkReasonStore;
use mowerhub_domain::error::MowerError;
use mowerhub_domain::mode::{ParkReason, persisted_text};
use mowerhub_domain::time::now;

use crate::error::StorageError;

const SELECT: &str = "SELECT reason FROM park_reason WHERE id = 1";

const UPSERT: &str = r"
    INSERT INTO park_reason (id, reason, updated_at)
    VALUES (1, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        reason = excluded.reason,
        updated_at = excluded.updated_at
";

/// Park reason kept in a single-row table.
pub struct SqliteParkReasonStore {
    pool: SqlitePool,
}

impl SqliteParkReasonStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ParkReasonStore for SqliteParkReasonStore {
    async fn read(&self) -> Result<Option<String>, MowerError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.map(|(reason,)| reason))
    }

    async fn write(&self, reason: Option<ParkReason>) -> Result<(), MowerError> {
        sqlx::query(UPSERT)
            .bind(persisted_text(reason))
            .bind(now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn setup() -> SqliteParkReasonStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteParkReasonStore::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_return_none_when_nothing_written() {
        let store = setup().await;
        assert_eq!(store.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_read_back_written_reason() {
        let store = setup().await;
        store.write(Some(ParkReason::SessionBoundary)).await.unwrap();
        assert_eq!(
            store.read().await.unwrap().as_deref(),
            Some("session_boundary")
        );
    }

    #[tokio::test]
    async fn should_overwrite_previous_reason() {
        let store = setup().await;
        store.write(Some(ParkReason::Rain)).await.unwrap();
        store.write(None).await.unwrap();

        assert_eq!(store.read().await.unwrap().as_deref(), Some("none"));
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM park_reason")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn should_return_raw_text_it_cannot_interpret() {
        let store = setup().await;
        sqlx::query("INSERT INTO park_reason (id, reason, updated_at) VALUES (1, 'siesta', '')")
            .execute(&store.pool)
            .await
            .unwrap();
        assert_eq!(store.read().await.unwrap().as_deref(), Some("siesta"));
    }
}
