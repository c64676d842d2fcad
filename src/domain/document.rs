use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub storage_type: String,
    /// Cleared when the uploading user is deleted; the document stays.
    pub uploaded_by: Option<Uuid>,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub sort_order: i64,
}
