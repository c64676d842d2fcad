use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{state::AppState, middleware::auth::CurrentUser},
    domain::{Announcement, AnnouncementSummary, AnnouncementType, UnreadAnnouncement},
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    pub announcement_type: AnnouncementType,
    #[serde(default)]
    pub is_important: bool,
    pub publish_now: bool, // If true, set publish_at to now
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub announcement_type: Option<AnnouncementType>,
    pub is_important: Option<bool>,
    pub publish_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize)]
pub struct ListAnnouncementsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub ok: bool,
    pub read_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub ok: bool,
    pub newly_marked: u64,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListAnnouncementsQuery>,
) -> Result<Json<Vec<Announcement>>> {
    let limit = params.limit.unwrap_or(20).min(100);
    let offset = params.offset.unwrap_or(0).max(0);

    let announcements = state.service_context.announcement_repo.list(limit, offset).await?;

    Ok(Json(announcements))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>> {
    let announcement = state.service_context.announcement_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Announcement not found".to_string()))?;

    Ok(Json(announcement))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>)> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }

    let announcement = Announcement {
        id: Uuid::new_v4(),
        title: request.title,
        content: request.content,
        announcement_type: request.announcement_type,
        is_important: request.is_important
            || request.announcement_type == AnnouncementType::Important,
        publish_at: if request.publish_now {
            Some(Utc::now())
        } else {
            None
        },
        created_by: Some(user.user.id),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let created = state.service_context.announcement_service.create(announcement).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>> {
    let mut announcement = state.service_context.announcement_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Announcement not found".to_string()))?;

    if let Some(title) = request.title {
        announcement.title = title;
    }
    if let Some(content) = request.content {
        announcement.content = content;
    }
    if let Some(announcement_type) = request.announcement_type {
        announcement.announcement_type = announcement_type;
    }
    if let Some(is_important) = request.is_important {
        announcement.is_important = is_important;
    }
    if let Some(publish_at) = request.publish_at {
        announcement.publish_at = publish_at;
    }

    announcement.updated_at = Utc::now();

    let updated = state.service_context.announcement_repo.update(id, announcement).await?;

    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.announcement_service.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<AnnouncementSummary>> {
    let summary = state.service_context.announcement_service
        .summary(user.user.id)
        .await?;

    Ok(Json(summary))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UnreadCountResponse>> {
    let unread_count = state.service_context.announcement_service
        .unread_count(user.user.id)
        .await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

pub async fn unread_list(
    State(state): State<AppState>,
    Query(params): Query<ListAnnouncementsQuery>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<UnreadAnnouncement>>> {
    let unread = state.service_context.announcement_service
        .unread_list(user.user.id, params.limit)
        .await?;

    Ok(Json(unread))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MarkReadResponse>> {
    let read_at = state.service_context.announcement_service
        .mark_read(id, user.user.id)
        .await?;

    Ok(Json(MarkReadResponse { ok: true, read_at }))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MarkAllReadResponse>> {
    let newly_marked = state.service_context.announcement_service
        .mark_all_read(user.user.id)
        .await?;

    Ok(Json(MarkAllReadResponse { ok: true, newly_marked }))
}
