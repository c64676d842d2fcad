use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub parent_id: Option<Uuid>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum UserRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum UserStatus {
    Active,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub role: UserRole,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub avatar_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub disabled: i64,
    pub admin_count: i64,
}

/// One node of the org hierarchy, with its subtree attached.
#[derive(Debug, Clone, Serialize)]
pub struct OrgNode {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub children: Vec<OrgNode>,
}
