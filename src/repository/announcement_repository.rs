use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Announcement, AnnouncementType, Attachment},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    content: String,
    announcement_type: String,
    is_important: i32,
    publish_at: Option<NaiveDateTime>,
    created_by: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct AttachmentRow {
    id: String,
    announcement_id: String,
    file_name: String,
    file_url: String,
    file_size: i64,
    storage_type: String,
    created_at: NaiveDateTime,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            content: row.content,
            announcement_type: Self::parse_announcement_type(&row.announcement_type)?,
            is_important: row.is_important != 0,
            publish_at: row.publish_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_by: row.created_by
                .map(|c| Uuid::parse_str(&c).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_attachment(row: AttachmentRow) -> Result<Attachment> {
        Ok(Attachment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            announcement_id: Uuid::parse_str(&row.announcement_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            file_name: row.file_name,
            file_url: row.file_url,
            file_size: row.file_size,
            storage_type: row.storage_type,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }

    fn parse_announcement_type(s: &str) -> Result<AnnouncementType> {
        match s {
            "general" => Ok(AnnouncementType::General),
            "important" => Ok(AnnouncementType::Important),
            "resource" => Ok(AnnouncementType::Resource),
            "training" => Ok(AnnouncementType::Training),
            _ => Err(AppError::Database(format!("Invalid announcement type: {}", s))),
        }
    }

    pub(crate) fn announcement_type_to_str(announcement_type: &AnnouncementType) -> &'static str {
        match announcement_type {
            AnnouncementType::General => "general",
            AnnouncementType::Important => "important",
            AnnouncementType::Resource => "resource",
            AnnouncementType::Training => "training",
        }
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement> {
        let id_str = announcement.id.to_string();
        let type_str = Self::announcement_type_to_str(&announcement.announcement_type);
        let is_important_int = if announcement.is_important { 1i32 } else { 0i32 };
        let publish_at_naive = announcement.publish_at.map(|dt| dt.naive_utc());
        let created_by_str = announcement.created_by.map(|c| c.to_string());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, title, content, announcement_type, is_important,
                publish_at, created_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(type_str)
        .bind(is_important_int)
        .bind(publish_at_naive)
        .bind(&created_by_str)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(announcement.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, content, announcement_type, is_important,
                   publish_at, created_by, created_at, updated_at
            FROM announcements
            WHERE id = ?
            "#
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_announcement(r)?)),
            None => Ok(None)
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(
            r#"
            SELECT id, title, content, announcement_type, is_important,
                   publish_at, created_by, created_at, updated_at
            FROM announcements
            ORDER BY publish_at DESC
            LIMIT ? OFFSET ?
            "#
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }

    async fn update(&self, id: Uuid, announcement: Announcement) -> Result<Announcement> {
        let id_str = id.to_string();
        let type_str = Self::announcement_type_to_str(&announcement.announcement_type);
        let is_important_int = if announcement.is_important { 1i32 } else { 0i32 };
        let publish_at_naive = announcement.publish_at.map(|dt| dt.naive_utc());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, content = ?, announcement_type = ?,
                is_important = ?, publish_at = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(type_str)
        .bind(is_important_int)
        .bind(publish_at_naive)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated announcement".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Receipts and attachments go with it via ON DELETE CASCADE.
        let id_str = id.to_string();
        sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn add_attachment(&self, attachment: Attachment) -> Result<Attachment> {
        let id_str = attachment.id.to_string();
        let announcement_id_str = attachment.announcement_id.to_string();
        let created_at_naive = attachment.created_at.naive_utc();

        sqlx::query(
            r#"
            INSERT INTO attachments (
                id, announcement_id, file_name, file_url, file_size,
                storage_type, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&announcement_id_str)
        .bind(&attachment.file_name)
        .bind(&attachment.file_url)
        .bind(attachment.file_size)
        .bind(&attachment.storage_type)
        .bind(created_at_naive)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(attachment)
    }

    async fn list_attachments(&self, announcement_id: Uuid) -> Result<Vec<Attachment>> {
        let announcement_id_str = announcement_id.to_string();
        let rows = sqlx::query_as::<_, AttachmentRow>(
            r#"
            SELECT id, announcement_id, file_name, file_url, file_size,
                   storage_type, created_at
            FROM attachments
            WHERE announcement_id = ?
            ORDER BY created_at
            "#
        )
        .bind(announcement_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_attachment)
            .collect()
    }
}
