use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{User, UserRole, UserStatus, CreateUserRequest, UpdateUserRequest, UserStats},
    error::{AppError, Result},
    repository::UserRepository,
};

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    username: String,
    full_name: String,
    password_hash: String,
    role: String,
    status: String,
    parent_id: Option<String>,
    avatar_url: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const USER_COLUMNS: &str = "id, email, username, full_name, password_hash, role, status, parent_id, avatar_url, created_at, updated_at";

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<User> {
        Ok(User {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            username: row.username,
            full_name: row.full_name,
            password_hash: row.password_hash,
            role: Self::parse_role(&row.role)?,
            status: Self::parse_status(&row.status)?,
            parent_id: row.parent_id
                .map(|p| Uuid::parse_str(&p).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            avatar_url: row.avatar_url,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_role(s: &str) -> Result<UserRole> {
        match s {
            "Admin" => Ok(UserRole::Admin),
            "Member" => Ok(UserRole::Member),
            _ => Err(AppError::Database(format!("Invalid user role: {}", s))),
        }
    }

    fn role_to_str(role: &UserRole) -> &'static str {
        match role {
            UserRole::Admin => "Admin",
            UserRole::Member => "Member",
        }
    }

    fn parse_status(s: &str) -> Result<UserStatus> {
        match s {
            "Active" => Ok(UserStatus::Active),
            "Disabled" => Ok(UserStatus::Disabled),
            _ => Err(AppError::Database(format!("Invalid user status: {}", s))),
        }
    }

    fn status_to_str(status: &UserStatus) -> &'static str {
        match status {
            UserStatus::Active => "Active",
            UserStatus::Disabled => "Disabled",
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: CreateUserRequest, password_hash: String) -> Result<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let parent_id_str = user.parent_id.map(|p| p.to_string());
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, full_name, password_hash, role, status,
                parent_id, avatar_url, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&password_hash)
        .bind(Self::role_to_str(&user.role))
        .bind(Self::status_to_str(&UserStatus::Active))
        .bind(parent_id_str)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created user".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, UserRow>(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS)
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS)
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS)
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_user(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            &format!(
                "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
                USER_COLUMNS
            )
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn list_active_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM users WHERE status = 'Active' ORDER BY created_at"
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        ids.into_iter()
            .map(|id| Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string())))
            .collect()
    }

    async fn update(&self, id: Uuid, update: UpdateUserRequest) -> Result<User> {
        let mut user = self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = avatar_url;
        }

        let now = Utc::now().naive_utc();
        let id_str = id.to_string();

        sqlx::query(
            r#"
            UPDATE users
            SET email = ?, full_name = ?, role = ?, status = ?, avatar_url = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(Self::role_to_str(&user.role))
        .bind(Self::status_to_str(&user.status))
        .bind(&user.avatar_url)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated user".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn stats(&self) -> Result<UserStats> {
        let row: (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'Active'),
                COUNT(*) FILTER (WHERE status = 'Disabled'),
                COUNT(*) FILTER (WHERE role = 'Admin')
            FROM users
            "#
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(UserStats {
            total: row.0,
            active: row.1,
            disabled: row.2,
            admin_count: row.3,
        })
    }

    async fn children(&self, id: Uuid) -> Result<Vec<User>> {
        let id_str = id.to_string();
        let rows = sqlx::query_as::<_, UserRow>(
            &format!(
                "SELECT {} FROM users WHERE parent_id = ? ORDER BY username",
                USER_COLUMNS
            )
        )
        .bind(id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn subtree(&self, root: Uuid) -> Result<Vec<User>> {
        let root_str = root.to_string();
        let rows = sqlx::query_as::<_, UserRow>(
            &format!(
                r#"
                WITH RECURSIVE descendants(id) AS (
                    SELECT id FROM users WHERE id = ?
                    UNION ALL
                    SELECT u.id FROM users u
                    JOIN descendants d ON u.parent_id = d.id
                )
                SELECT {} FROM users WHERE id IN (SELECT id FROM descendants)
                ORDER BY username
                "#,
                USER_COLUMNS
            )
        )
        .bind(root_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_user).collect()
    }

    async fn set_parent(&self, id: Uuid, parent_id: Option<Uuid>) -> Result<()> {
        if parent_id == Some(id) {
            return Err(AppError::Validation("A user cannot be their own parent".to_string()));
        }

        // Reparenting under one's own descendant would cut a cycle into the
        // tree; walk the subtree first.
        if let Some(parent) = parent_id {
            let descendants = self.subtree(id).await?;
            if descendants.iter().any(|u| u.id == parent) {
                return Err(AppError::Validation(
                    "Cannot move a user under their own descendant".to_string(),
                ));
            }
        }

        let id_str = id.to_string();
        let parent_str = parent_id.map(|p| p.to_string());
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            "UPDATE users SET parent_id = ?, updated_at = ? WHERE id = ?"
        )
        .bind(parent_str)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }
}
