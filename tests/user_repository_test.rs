mod common;

use atrium::{
    domain::{AnnouncementType, Document, UpdateUserRequest, UserRole, UserStatus},
    error::AppError,
    repository::{
        AnnouncementRepository, DocumentRepository, SqliteAnnouncementRepository,
        SqliteDocumentRepository, SqliteUserRepository, UserRepository,
    },
};
use chrono::Utc;
use common::{create_announcement, create_user, test_pool};
use uuid::Uuid;

#[tokio::test]
async fn test_user_crud() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let user = create_user(&pool, "testuser", UserRole::Member).await?;
    assert_eq!(user.email, "testuser@example.com");
    assert_eq!(user.status, UserStatus::Active);
    assert_eq!(user.role, UserRole::Member);

    let found = repo.find_by_id(user.id).await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().id, user.id);

    let found_by_email = repo.find_by_email("testuser@example.com").await?;
    assert!(found_by_email.is_some());

    let found_by_username = repo.find_by_username("testuser").await?;
    assert!(found_by_username.is_some());

    let users = repo.list(10, 0).await?;
    assert_eq!(users.len(), 1);

    let updated = repo.update(user.id, UpdateUserRequest {
        status: Some(UserStatus::Disabled),
        role: Some(UserRole::Admin),
        ..Default::default()
    }).await?;
    assert_eq!(updated.status, UserStatus::Disabled);
    assert_eq!(updated.role, UserRole::Admin);

    repo.delete(user.id).await?;
    assert!(repo.find_by_id(user.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_user_stats() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    create_user(&pool, "admin", UserRole::Admin).await?;
    create_user(&pool, "member1", UserRole::Member).await?;
    let member2 = create_user(&pool, "member2", UserRole::Member).await?;

    repo.update(member2.id, UpdateUserRequest {
        status: Some(UserStatus::Disabled),
        ..Default::default()
    }).await?;

    let stats = repo.stats().await?;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.disabled, 1);
    assert_eq!(stats.admin_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_org_tree_queries() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let root = create_user(&pool, "root", UserRole::Admin).await?;
    let child_a = create_user(&pool, "child_a", UserRole::Member).await?;
    let child_b = create_user(&pool, "child_b", UserRole::Member).await?;
    let grandchild = create_user(&pool, "grandchild", UserRole::Member).await?;

    repo.set_parent(child_a.id, Some(root.id)).await?;
    repo.set_parent(child_b.id, Some(root.id)).await?;
    repo.set_parent(grandchild.id, Some(child_a.id)).await?;

    let children = repo.children(root.id).await?;
    assert_eq!(children.len(), 2);

    let subtree = repo.subtree(root.id).await?;
    assert_eq!(subtree.len(), 4);

    let partial = repo.subtree(child_a.id).await?;
    assert_eq!(partial.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_delete_user_detaches_authored_content() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());
    let announcement_repo = SqliteAnnouncementRepository::new(pool.clone());
    let document_repo = SqliteDocumentRepository::new(pool.clone());

    let admin = create_user(&pool, "admin", UserRole::Admin).await?;
    let announcement =
        create_announcement(&pool, admin.id, "Handover notes", AnnouncementType::General).await?;

    let now = Utc::now();
    let document = document_repo.create(Document {
        id: Uuid::new_v4(),
        title: "Price list".to_string(),
        category_id: None,
        file_name: "prices.pdf".to_string(),
        file_url: "uploads/documents/prices.pdf".to_string(),
        file_size: 1024,
        storage_type: "local".to_string(),
        uploaded_by: Some(admin.id),
        download_count: 0,
        created_at: now,
        updated_at: now,
    }).await?;

    // Authored content must not block the delete; it survives unattributed.
    repo.delete(admin.id).await?;

    let orphaned = announcement_repo.find_by_id(announcement.id).await?.unwrap();
    assert_eq!(orphaned.created_by, None);

    let orphaned_doc = document_repo.find_by_id(document.id).await?.unwrap();
    assert_eq!(orphaned_doc.uploaded_by, None);

    Ok(())
}

#[tokio::test]
async fn test_set_parent_rejects_cycles() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let root = create_user(&pool, "root", UserRole::Admin).await?;
    let child = create_user(&pool, "child", UserRole::Member).await?;

    repo.set_parent(child.id, Some(root.id)).await?;

    // Self-parenting and reparenting under a descendant both close a cycle.
    let own = repo.set_parent(root.id, Some(root.id)).await;
    assert!(matches!(own, Err(AppError::Validation(_))));

    let descendant = repo.set_parent(root.id, Some(child.id)).await;
    assert!(matches!(descendant, Err(AppError::Validation(_))));

    // Detaching is always allowed.
    repo.set_parent(child.id, None).await?;
    assert_eq!(repo.children(root.id).await?.len(), 0);

    Ok(())
}
