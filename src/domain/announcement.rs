use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementType,
    pub is_important: bool,
    pub publish_at: Option<DateTime<Utc>>,
    /// Cleared when the authoring user is deleted; the announcement stays.
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementType {
    General,
    Important,
    Resource,
    Training,
}

/// Record that a user has read an announcement. At most one per
/// (announcement, user); repeated mark-read calls refresh `read_at`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadReceipt {
    pub announcement_id: Uuid,
    pub user_id: Uuid,
    pub read_at: DateTime<Utc>,
}

/// Projection returned by the unread listing; just enough for an inbox row.
#[derive(Debug, Clone, Serialize)]
pub struct UnreadAnnouncement {
    pub id: Uuid,
    pub title: String,
    pub publish_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementSummary {
    pub total: i64,
    pub unread: i64,
    pub important: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub id: Uuid,
    pub announcement_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub storage_type: String,
    pub created_at: DateTime<Utc>,
}
