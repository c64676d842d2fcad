use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
    Extension,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{state::AppState, middleware::auth::CurrentUser},
    domain::{CreateUserRequest, OrgNode, UpdateUserRequest, User, UserRole, UserStats},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserBody {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Option<UserRole>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SetParentRequest {
    pub parent_id: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>> {
    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0).max(0);

    let users = state.service_context.user_repo.list(limit, offset).await?;

    Ok(Json(users))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>> {
    let user = state.service_context.user_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<User>)> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = CreateUserRequest {
        email: body.email,
        username: body.username,
        full_name: body.full_name,
        password: body.password,
        role: body.role.unwrap_or(UserRole::Member),
        parent_id: body.parent_id,
    };

    let user = state.service_context.user_service.create_user(request).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let user = state.service_context.user_service.update_user(id, request).await?;

    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.user_service.delete_user(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<UserStats>> {
    let stats = state.service_context.user_repo.stats().await?;

    Ok(Json(stats))
}

pub async fn children(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>> {
    state.service_context.user_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let children = state.service_context.user_repo.children(id).await?;

    Ok(Json(children))
}

pub async fn tree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrgNode>> {
    let tree = state.service_context.user_service.org_tree(id).await?;

    Ok(Json(tree))
}

pub async fn set_parent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetParentRequest>,
) -> Result<StatusCode> {
    if let Some(parent) = request.parent_id {
        state.service_context.user_repo
            .find_by_id(parent)
            .await?
            .ok_or(AppError::NotFound("Parent user not found".to_string()))?;
    }

    state.service_context.user_repo.set_parent(id, request.parent_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<Json<User>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() != Some("avatar") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation("Missing filename".to_string()))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let updated = state.service_context.user_service
            .set_avatar(user.user.id, &filename, &data)
            .await?;

        return Ok(Json(updated));
    }

    Err(AppError::Validation("Missing avatar field".to_string()))
}
