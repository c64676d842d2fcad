use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{ReadReceipt, UnreadAnnouncement, AnnouncementSummary},
    error::{AppError, Result},
    repository::ReadReceiptRepository,
};

#[derive(FromRow)]
struct ReceiptRow {
    announcement_id: String,
    user_id: String,
    read_at: NaiveDateTime,
}

#[derive(FromRow)]
struct UnreadRow {
    id: String,
    title: String,
    publish_at: Option<NaiveDateTime>,
}

pub struct SqliteReadReceiptRepository {
    pool: SqlitePool,
}

impl SqliteReadReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_receipt(row: ReceiptRow) -> Result<ReadReceipt> {
        Ok(ReadReceipt {
            announcement_id: Uuid::parse_str(&row.announcement_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            read_at: DateTime::from_naive_utc_and_offset(row.read_at, Utc),
        })
    }
}

#[async_trait]
impl ReadReceiptRepository for SqliteReadReceiptRepository {
    async fn mark_read(&self, announcement_id: Uuid, user_id: Uuid) -> Result<DateTime<Utc>> {
        let announcement_id_str = announcement_id.to_string();
        let user_id_str = user_id.to_string();
        let now = Utc::now();
        let now_naive = now.naive_utc();

        // Idempotent: the unique (announcement_id, user_id) key makes a
        // repeat call refresh read_at instead of adding a second row.
        sqlx::query(
            r#"
            INSERT INTO announcement_reads (announcement_id, user_id, read_at)
            VALUES (?, ?, ?)
            ON CONFLICT(announcement_id, user_id) DO UPDATE SET read_at = excluded.read_at
            "#
        )
        .bind(&announcement_id_str)
        .bind(&user_id_str)
        .bind(now_naive)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(now)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let user_id_str = user_id.to_string();
        let now_naive = Utc::now().naive_utc();

        // One statement end to end, so concurrent calls cannot leave a
        // partial marking; conflict-do-nothing keeps already-read rows as
        // they are and out of the returned count.
        let result = sqlx::query(
            r#"
            INSERT INTO announcement_reads (announcement_id, user_id, read_at)
            SELECT a.id, ?, ?
            FROM announcements a
            WHERE NOT EXISTS (
                SELECT 1 FROM announcement_reads r
                WHERE r.announcement_id = a.id AND r.user_id = ?
            )
            ON CONFLICT(announcement_id, user_id) DO NOTHING
            "#
        )
        .bind(&user_id_str)
        .bind(now_naive)
        .bind(&user_id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn find(&self, announcement_id: Uuid, user_id: Uuid) -> Result<Option<ReadReceipt>> {
        let announcement_id_str = announcement_id.to_string();
        let user_id_str = user_id.to_string();

        let row = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT announcement_id, user_id, read_at
            FROM announcement_reads
            WHERE announcement_id = ? AND user_id = ?
            "#
        )
        .bind(&announcement_id_str)
        .bind(&user_id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_receipt(r)?)),
            None => Ok(None),
        }
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let user_id_str = user_id.to_string();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM announcements a
            WHERE NOT EXISTS (
                SELECT 1 FROM announcement_reads r
                WHERE r.announcement_id = a.id AND r.user_id = ?
            )
            "#
        )
        .bind(&user_id_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }

    async fn unread_list(&self, user_id: Uuid, limit: i64) -> Result<Vec<UnreadAnnouncement>> {
        let user_id_str = user_id.to_string();

        let rows = sqlx::query_as::<_, UnreadRow>(
            r#"
            SELECT a.id, a.title, a.publish_at
            FROM announcements a
            WHERE NOT EXISTS (
                SELECT 1 FROM announcement_reads r
                WHERE r.announcement_id = a.id AND r.user_id = ?
            )
            ORDER BY a.publish_at DESC
            LIMIT ?
            "#
        )
        .bind(&user_id_str)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                Ok(UnreadAnnouncement {
                    id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
                    title: row.title,
                    publish_at: row.publish_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
                })
            })
            .collect()
    }

    async fn summary(&self, user_id: Uuid) -> Result<AnnouncementSummary> {
        let user_id_str = user_id.to_string();

        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM announcements),
                (SELECT COUNT(*) FROM announcements a
                 WHERE NOT EXISTS (
                     SELECT 1 FROM announcement_reads r
                     WHERE r.announcement_id = a.id AND r.user_id = ?
                 )),
                (SELECT COUNT(*) FROM announcements WHERE announcement_type = 'important')
            "#
        )
        .bind(&user_id_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(AnnouncementSummary {
            total: row.0,
            unread: row.1,
            important: row.2,
        })
    }
}
