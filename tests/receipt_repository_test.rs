mod common;

use atrium::{
    domain::{AnnouncementType, UserRole},
    repository::{ReadReceiptRepository, SqliteReadReceiptRepository},
};
use common::{create_announcement, create_user, test_pool};

#[tokio::test]
async fn test_mark_read_is_idempotent() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let reader = create_user(&pool, "reader", UserRole::Member).await?;
    let announcement =
        create_announcement(&pool, admin.id, "Welcome", AnnouncementType::General).await?;

    let repo = SqliteReadReceiptRepository::new(pool.clone());

    let first = repo.mark_read(announcement.id, reader.id).await?;
    let second = repo.mark_read(announcement.id, reader.id).await?;
    assert!(second >= first);

    // Exactly one receipt row, carrying the second call's timestamp.
    let row_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM announcement_reads WHERE announcement_id = ? AND user_id = ?"
    )
    .bind(announcement.id.to_string())
    .bind(reader.id.to_string())
    .fetch_one(&pool)
    .await?;
    assert_eq!(row_count, 1);

    let receipt = repo.find(announcement.id, reader.id).await?.unwrap();
    assert_eq!(receipt.read_at, second);

    Ok(())
}

#[tokio::test]
async fn test_unread_count_decreases_only_on_first_read() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let reader = create_user(&pool, "reader", UserRole::Member).await?;

    let a = create_announcement(&pool, admin.id, "First", AnnouncementType::General).await?;
    create_announcement(&pool, admin.id, "Second", AnnouncementType::General).await?;

    let repo = SqliteReadReceiptRepository::new(pool.clone());

    assert_eq!(repo.unread_count(reader.id).await?, 2);

    repo.mark_read(a.id, reader.id).await?;
    assert_eq!(repo.unread_count(reader.id).await?, 1);

    // Re-reading the same announcement changes nothing.
    repo.mark_read(a.id, reader.id).await?;
    assert_eq!(repo.unread_count(reader.id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_mark_all_read_reports_newly_marked() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let reader = create_user(&pool, "reader", UserRole::Member).await?;

    let a = create_announcement(&pool, admin.id, "One", AnnouncementType::General).await?;
    create_announcement(&pool, admin.id, "Two", AnnouncementType::Resource).await?;
    create_announcement(&pool, admin.id, "Three", AnnouncementType::Training).await?;

    let repo = SqliteReadReceiptRepository::new(pool.clone());

    repo.mark_read(a.id, reader.id).await?;
    let unread_before = repo.unread_count(reader.id).await?;
    assert_eq!(unread_before, 2);

    let newly_marked = repo.mark_all_read(reader.id).await?;
    assert_eq!(newly_marked as i64, unread_before);
    assert_eq!(repo.unread_count(reader.id).await?, 0);

    // Already fully read: a second sweep marks nothing.
    assert_eq!(repo.mark_all_read(reader.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_unread_list_is_capped_and_ordered() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let reader = create_user(&pool, "reader", UserRole::Member).await?;

    for i in 0..5 {
        create_announcement(&pool, admin.id, &format!("Item {}", i), AnnouncementType::General)
            .await?;
    }

    let repo = SqliteReadReceiptRepository::new(pool.clone());

    let listed = repo.unread_list(reader.id, 3).await?;
    assert_eq!(listed.len(), 3);

    // Newest publish_at first.
    let times: Vec<_> = listed.iter().map(|u| u.publish_at).collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);

    Ok(())
}

#[tokio::test]
async fn test_summary_tracks_per_user_read_state() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let user1 = create_user(&pool, "user1", UserRole::Member).await?;
    let user2 = create_user(&pool, "user2", UserRole::Member).await?;

    let maintenance =
        create_announcement(&pool, admin.id, "Maintenance", AnnouncementType::Important).await?;

    let repo = SqliteReadReceiptRepository::new(pool.clone());

    let summary = repo.summary(user1.id).await?;
    assert_eq!(summary.total, 1);
    assert_eq!(summary.unread, 1);
    assert_eq!(summary.important, 1);

    repo.mark_read(maintenance.id, user1.id).await?;

    let summary1 = repo.summary(user1.id).await?;
    assert_eq!(summary1.unread, 0);

    // Read state is per user: user2 still has it pending.
    let summary2 = repo.summary(user2.id).await?;
    assert_eq!(summary2.unread, 1);
    assert_eq!(summary2.important, 1);

    Ok(())
}
