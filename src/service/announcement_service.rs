use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    cache::SimpleCache,
    domain::{Announcement, AnnouncementSummary, UnreadAnnouncement},
    error::{AppError, Result},
    repository::{AnnouncementRepository, ReadReceiptRepository},
    uploads,
};

const SUMMARY_CACHE_CAPACITY: usize = 256;
const SUMMARY_CACHE_TTL: Duration = Duration::from_secs(30);

/// Unread listing is capped regardless of what the caller asks for.
pub const UNREAD_LIST_MAX: i64 = 100;

pub struct AnnouncementService {
    announcement_repo: Arc<dyn AnnouncementRepository>,
    receipt_repo: Arc<dyn ReadReceiptRepository>,
    // Read-through accelerator for the summary endpoint only; a miss or a
    // stale entry just costs one extra query.
    summary_cache: SimpleCache<AnnouncementSummary>,
    uploads_dir: String,
}

impl AnnouncementService {
    pub fn new(
        announcement_repo: Arc<dyn AnnouncementRepository>,
        receipt_repo: Arc<dyn ReadReceiptRepository>,
        uploads_dir: String,
    ) -> Self {
        Self {
            announcement_repo,
            receipt_repo,
            summary_cache: SimpleCache::new(SUMMARY_CACHE_CAPACITY),
            uploads_dir,
        }
    }

    pub async fn mark_read(&self, announcement_id: Uuid, user_id: Uuid) -> Result<DateTime<Utc>> {
        self.announcement_repo
            .find_by_id(announcement_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        let read_at = self.receipt_repo.mark_read(announcement_id, user_id).await?;
        self.summary_cache.remove(&summary_key(user_id));

        Ok(read_at)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let newly_marked = self.receipt_repo.mark_all_read(user_id).await?;
        self.summary_cache.remove(&summary_key(user_id));

        Ok(newly_marked)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        self.receipt_repo.unread_count(user_id).await
    }

    pub async fn unread_list(&self, user_id: Uuid, limit: Option<i64>) -> Result<Vec<UnreadAnnouncement>> {
        let limit = limit.unwrap_or(UNREAD_LIST_MAX).clamp(1, UNREAD_LIST_MAX);
        self.receipt_repo.unread_list(user_id, limit).await
    }

    pub async fn summary(&self, user_id: Uuid) -> Result<AnnouncementSummary> {
        let key = summary_key(user_id);
        if let Some(cached) = self.summary_cache.get(&key) {
            return Ok(cached);
        }

        let summary = self.receipt_repo.summary(user_id).await?;
        self.summary_cache.set(&key, summary.clone(), SUMMARY_CACHE_TTL);

        Ok(summary)
    }

    /// Deletes the announcement (receipts and attachment rows cascade) and
    /// cleans up attachment files without blocking or failing the caller.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let attachments = self.announcement_repo.list_attachments(id).await?;

        self.announcement_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        self.announcement_repo.delete(id).await?;

        for attachment in attachments {
            uploads::delete_file_best_effort(self.uploads_dir.clone(), attachment.file_url);
        }

        Ok(())
    }

    pub async fn create(&self, announcement: Announcement) -> Result<Announcement> {
        self.announcement_repo.create(announcement).await
    }
}

fn summary_key(user_id: Uuid) -> String {
    format!("announcement_summary:{}", user_id)
}
