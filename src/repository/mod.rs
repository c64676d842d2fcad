use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod announcement_repository;
pub mod receipt_repository;
pub mod credit_repository;
pub mod document_repository;

pub use user_repository::SqliteUserRepository;
pub use announcement_repository::SqliteAnnouncementRepository;
pub use receipt_repository::SqliteReadReceiptRepository;
pub use credit_repository::SqliteCreditRepository;
pub use document_repository::SqliteDocumentRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest, password_hash: String) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
    async fn list_active_ids(&self) -> Result<Vec<Uuid>>;
    async fn update(&self, id: Uuid, update: UpdateUserRequest) -> Result<User>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn stats(&self) -> Result<UserStats>;
    async fn children(&self, id: Uuid) -> Result<Vec<User>>;
    async fn subtree(&self, root: Uuid) -> Result<Vec<User>>;
    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<()>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Announcement>>;
    async fn update(&self, id: Uuid, announcement: Announcement) -> Result<Announcement>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn add_attachment(&self, attachment: Attachment) -> Result<Attachment>;
    async fn list_attachments(&self, announcement_id: Uuid) -> Result<Vec<Attachment>>;
}

#[async_trait]
pub trait ReadReceiptRepository: Send + Sync {
    /// Upserts the receipt and returns its `read_at`. Idempotent: a repeat
    /// call refreshes the timestamp rather than adding a row.
    async fn mark_read(&self, announcement_id: Uuid, user_id: Uuid) -> Result<DateTime<Utc>>;
    /// One insert-select with conflict-do-nothing; returns newly inserted rows.
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64>;
    async fn find(&self, announcement_id: Uuid, user_id: Uuid) -> Result<Option<ReadReceipt>>;
    async fn unread_count(&self, user_id: Uuid) -> Result<i64>;
    async fn unread_list(&self, user_id: Uuid, limit: i64) -> Result<Vec<UnreadAnnouncement>>;
    async fn summary(&self, user_id: Uuid) -> Result<AnnouncementSummary>;
}

#[async_trait]
pub trait CreditRepository: Send + Sync {
    /// Atomically decrements the balance and appends a negative audit row.
    /// Fails with InsufficientCredits without writing anything when the
    /// balance does not cover `amount`.
    async fn consume(&self, user_id: Uuid, amount: i64, description: &str) -> Result<CreditAccount>;
    /// Atomically increments the balance (creating the account row if
    /// needed) and appends a positive audit row. Not idempotent per logical
    /// grant; callers own scheduling discipline.
    async fn grant(&self, user_id: Uuid, amount: i64, description: &str) -> Result<CreditAccount>;
    async fn balance(&self, user_id: Uuid) -> Result<i64>;
    async fn transactions(&self, user_id: Uuid, limit: i64) -> Result<Vec<CreditTransaction>>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_category(&self, category: DocumentCategory) -> Result<DocumentCategory>;
    async fn list_categories(&self) -> Result<Vec<DocumentCategory>>;
    async fn delete_category(&self, id: Uuid) -> Result<()>;
    async fn create(&self, document: Document) -> Result<Document>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>>;
    async fn list(&self, category_id: Option<Uuid>, limit: i64, offset: i64) -> Result<Vec<Document>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn record_download(&self, id: Uuid) -> Result<i64>;
}
