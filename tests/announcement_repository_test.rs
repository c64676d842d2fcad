mod common;

use atrium::{
    domain::{AnnouncementType, Attachment, UserRole},
    repository::{
        AnnouncementRepository, ReadReceiptRepository, SqliteAnnouncementRepository,
        SqliteReadReceiptRepository,
    },
};
use chrono::Utc;
use common::{create_announcement, create_user, test_pool};
use uuid::Uuid;

#[tokio::test]
async fn test_announcement_crud() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let repo = SqliteAnnouncementRepository::new(pool.clone());

    let mut announcement =
        create_announcement(&pool, admin.id, "Quarterly update", AnnouncementType::General).await?;
    assert_eq!(announcement.title, "Quarterly update");

    let found = repo.find_by_id(announcement.id).await?;
    assert!(found.is_some());

    announcement.title = "Quarterly update (revised)".to_string();
    announcement.announcement_type = AnnouncementType::Important;
    let updated = repo.update(announcement.id, announcement.clone()).await?;
    assert_eq!(updated.title, "Quarterly update (revised)");
    assert_eq!(updated.announcement_type, AnnouncementType::Important);

    let listed = repo.list(10, 0).await?;
    assert_eq!(listed.len(), 1);

    repo.delete(announcement.id).await?;
    assert!(repo.find_by_id(announcement.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_attachments_belong_to_announcement() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let repo = SqliteAnnouncementRepository::new(pool.clone());

    let announcement =
        create_announcement(&pool, admin.id, "With files", AnnouncementType::Resource).await?;

    repo.add_attachment(Attachment {
        id: Uuid::new_v4(),
        announcement_id: announcement.id,
        file_name: "brochure.pdf".to_string(),
        file_url: "uploads/documents/brochure.pdf".to_string(),
        file_size: 2048,
        storage_type: "local".to_string(),
        created_at: Utc::now(),
    }).await?;

    let attachments = repo.list_attachments(announcement.id).await?;
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].file_name, "brochure.pdf");

    Ok(())
}

#[tokio::test]
async fn test_delete_cascades_to_receipts_and_attachments() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let reader = create_user(&pool, "reader", UserRole::Member).await?;

    let repo = SqliteAnnouncementRepository::new(pool.clone());
    let receipts = SqliteReadReceiptRepository::new(pool.clone());

    let announcement =
        create_announcement(&pool, admin.id, "Ephemeral", AnnouncementType::General).await?;

    repo.add_attachment(Attachment {
        id: Uuid::new_v4(),
        announcement_id: announcement.id,
        file_name: "notes.pdf".to_string(),
        file_url: "uploads/documents/notes.pdf".to_string(),
        file_size: 512,
        storage_type: "local".to_string(),
        created_at: Utc::now(),
    }).await?;
    receipts.mark_read(announcement.id, reader.id).await?;

    repo.delete(announcement.id).await?;

    let receipt_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM announcement_reads WHERE announcement_id = ?"
    )
    .bind(announcement.id.to_string())
    .fetch_one(&pool)
    .await?;
    assert_eq!(receipt_count, 0);

    let attachment_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attachments WHERE announcement_id = ?"
    )
    .bind(announcement.id.to_string())
    .fetch_one(&pool)
    .await?;
    assert_eq!(attachment_count, 0);

    Ok(())
}
