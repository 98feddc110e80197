//! Notification repository: the append-only audit log behind the bell icon.

use apotek_core::types::{Notification, NotificationKind};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};

/// Input for recording a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    /// low | normal | high; defaults to normal.
    pub priority: Option<String>,
    pub customer_id: Option<i64>,
    pub medicine_id: Option<i64>,
}

/// Repository for notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Appends a notification.
    pub async fn insert(&self, new: NewNotification) -> DbResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications \
             (title, message, kind, priority, customer_id, medicine_id, is_read, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, ?) \
             RETURNING *",
        )
        .bind(new.title.trim())
        .bind(&new.message)
        .bind(new.kind)
        .bind(new.priority.as_deref().unwrap_or("normal"))
        .bind(new.customer_id)
        .bind(new.medicine_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    /// Number of unread notifications, for the badge.
    pub async fn unread_count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Most recent notifications, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Marks one notification as read.
    pub async fn mark_read(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }
        Ok(())
    }

    /// Marks everything as read.
    pub async fn mark_all_read(&self) -> DbResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE is_read = 0")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn restock_note(title: &str) -> NewNotification {
        NewNotification {
            title: title.to_string(),
            message: "Stok baru tersedia".to_string(),
            kind: NotificationKind::Restock,
            priority: None,
            customer_id: None,
            medicine_id: None,
        }
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_read() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.notifications();

        let a = repo.insert(restock_note("A")).await.unwrap();
        repo.insert(restock_note("B")).await.unwrap();
        assert_eq!(repo.unread_count().await.unwrap(), 2);
        assert_eq!(a.priority, "normal");

        repo.mark_read(a.id).await.unwrap();
        assert_eq!(repo.unread_count().await.unwrap(), 1);

        assert_eq!(repo.mark_all_read().await.unwrap(), 1);
        assert_eq!(repo.unread_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.notifications().mark_read(42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
