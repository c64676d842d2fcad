// Not every test binary uses every helper.
#![allow(dead_code)]

use atrium::{
    auth::AuthService,
    domain::{Announcement, AnnouncementType, CreateUserRequest, User, UserRole},
    repository::{
        AnnouncementRepository, SqliteAnnouncementRepository, SqliteUserRepository, UserRepository,
    },
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    // Create an in-memory SQLite database
    let pool = SqlitePool::connect(":memory:").await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

pub async fn create_user(pool: &SqlitePool, username: &str, role: UserRole) -> anyhow::Result<User> {
    let repo = SqliteUserRepository::new(pool.clone());
    let password_hash = AuthService::hash_password("password123").await?;

    let user = repo.create(CreateUserRequest {
        email: format!("{}@example.com", username),
        username: username.to_string(),
        full_name: format!("Test {}", username),
        password: "password123".to_string(),
        role,
        parent_id: None,
    }, password_hash).await?;

    Ok(user)
}

pub async fn create_announcement(
    pool: &SqlitePool,
    created_by: Uuid,
    title: &str,
    announcement_type: AnnouncementType,
) -> anyhow::Result<Announcement> {
    let repo = SqliteAnnouncementRepository::new(pool.clone());

    let announcement = repo.create(Announcement {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: format!("Content of {}", title),
        announcement_type,
        is_important: announcement_type == AnnouncementType::Important,
        publish_at: Some(Utc::now()),
        created_by: Some(created_by),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }).await?;

    Ok(announcement)
}
