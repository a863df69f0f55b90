//! `SQLite` implementation of [`NotificationHistory`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use mowerhub_app::ports::NotificationHistory;
use mowerhub_domain::error::MowerError;
use mowerhub_domain::id::NotificationId;
use mowerhub_domain::notification::{NotificationEvent, NotificationKind};
use mowerhub_domain::session::Session;

use crate::error::StorageError;

struct Wrapper(NotificationEvent);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let kind: String = row.try_get("kind")?;
        let at: String = row.try_get("at")?;
        let message: String = row.try_get("message")?;
        let silent: bool = row.try_get("silent")?;
        let session: Option<String> = row.try_get("session")?;

        let kind: NotificationKind = serde_json::from_str(&format!("\"{kind}\""))
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let at = chrono::DateTime::parse_from_rfc3339(&at)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();
        let session: Option<Session> = session
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(NotificationEvent {
            id: NotificationId::from_uuid(id),
            at,
            kind,
            message,
            silent,
            session,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO notifications (id, kind, at, message, silent, session)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_RECENT: &str = "SELECT * FROM notifications ORDER BY at DESC, rowid DESC LIMIT ?";

/// Append-only notification log.
pub struct SqliteNotificationHistory {
    pool: SqlitePool,
}

impl SqliteNotificationHistory {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl NotificationHistory for SqliteNotificationHistory {
    async fn append(&self, event: NotificationEvent) -> Result<(), MowerError> {
        let session = event
            .session
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(event.id.as_uuid())
            .bind(event.kind.as_str())
            .bind(event.at.to_rfc3339())
            .bind(&event.message)
            .bind(event.silent)
            .bind(session)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<NotificationEvent>, MowerError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
