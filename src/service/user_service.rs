use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthService,
    config::{CreditConfig, UploadConfig},
    domain::{CreateUserRequest, OrgNode, UpdateUserRequest, User, UserStatus},
    error::{AppError, Result},
    repository::{CreditRepository, UserRepository},
    uploads,
};

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    credit_repo: Arc<dyn CreditRepository>,
    auth_service: Arc<AuthService>,
    upload_config: UploadConfig,
    credit_config: CreditConfig,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        credit_repo: Arc<dyn CreditRepository>,
        auth_service: Arc<AuthService>,
        upload_config: UploadConfig,
        credit_config: CreditConfig,
    ) -> Self {
        Self {
            user_repo,
            credit_repo,
            auth_service,
            upload_config,
            credit_config,
        }
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if self.user_repo.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        if self.user_repo.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;
        let user = self.user_repo.create(request, password_hash).await?;

        // Welcome credits are a side grant; a failure here should not undo
        // the account, so it is logged and swallowed.
        if self.credit_config.registration_grant > 0 {
            if let Err(e) = self.credit_repo
                .grant(user.id, self.credit_config.registration_grant, "Registration credits")
                .await
            {
                tracing::warn!("Registration credit grant failed for user {}: {}", user.id, e);
            }
        }

        Ok(user)
    }

    pub async fn update_user(&self, id: Uuid, update: UpdateUserRequest) -> Result<User> {
        let disabling = matches!(update.status, Some(UserStatus::Disabled));
        let updated = self.user_repo.update(id, update).await?;

        // A disabled user must not ride out an existing session.
        if disabling {
            self.auth_service.invalidate_user_sessions(id).await?;
        }

        Ok(updated)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<()> {
        let user = self.user_repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.auth_service.invalidate_user_sessions(id).await?;
        self.user_repo.delete(id).await?;

        if let Some(avatar_url) = user.avatar_url {
            uploads::delete_file_best_effort(self.upload_config.dir.clone(), avatar_url);
        }

        Ok(())
    }

    /// Assembles the org subtree rooted at `root` from one recursive-CTE
    /// fetch; no per-level round trips.
    pub async fn org_tree(&self, root: Uuid) -> Result<OrgNode> {
        let users = self.user_repo.subtree(root).await?;

        let root_user = users.iter().find(|u| u.id == root).cloned()
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut by_parent: HashMap<Uuid, Vec<User>> = HashMap::new();
        for user in users {
            if user.id == root {
                continue;
            }
            if let Some(parent) = user.parent_id {
                by_parent.entry(parent).or_default().push(user);
            }
        }

        Ok(build_node(&root_user, &by_parent))
    }

    /// Stores a new avatar and points the user at it. The previous file is
    /// removed in a spawned task the caller never waits on.
    pub async fn set_avatar(&self, user_id: Uuid, filename: &str, data: &[u8]) -> Result<User> {
        let user = self.user_repo.find_by_id(user_id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let saved = uploads::save_image(
            &self.upload_config.dir,
            filename,
            data,
            self.upload_config.max_file_bytes,
        )
        .await?;

        let updated = self.user_repo
            .update(user_id, UpdateUserRequest {
                avatar_url: Some(Some(saved.file_url)),
                ..Default::default()
            })
            .await?;

        if let Some(old_url) = user.avatar_url {
            uploads::delete_file_best_effort(self.upload_config.dir.clone(), old_url);
        }

        Ok(updated)
    }
}

fn build_node(user: &User, by_parent: &HashMap<Uuid, Vec<User>>) -> OrgNode {
    let children = by_parent
        .get(&user.id)
        .map(|kids| kids.iter().map(|k| build_node(k, by_parent)).collect())
        .unwrap_or_default();

    OrgNode {
        id: user.id,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        children,
    }
}
