use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    api::{state::AppState, middleware::auth::CurrentUser},
    domain::{CreateCategoryRequest, Document, DocumentCategory},
    error::{AppError, Result},
    uploads,
};

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub category_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>> {
    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0).max(0);

    let documents = state.service_context.document_repo
        .list(params.category_id, limit, offset)
        .await?;

    Ok(Json(documents))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentCategory>>> {
    let categories = state.service_context.document_repo.list_categories().await?;

    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<DocumentCategory>)> {
    if request.name.trim().is_empty() || request.slug.trim().is_empty() {
        return Err(AppError::Validation("Name and slug must not be empty".to_string()));
    }

    let category = DocumentCategory {
        id: Uuid::new_v4(),
        name: request.name,
        slug: request.slug,
        sort_order: request.sort_order,
    };

    let created = state.service_context.document_repo.create_category(category).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.document_repo.delete_category(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Multipart upload: a `file` part plus optional `title` and `category_id`
/// text parts. Title defaults to the uploaded filename.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>)> {
    let mut title: Option<String> = None;
    let mut category_id: Option<Uuid> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        match field.name() {
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read title: {}", e))
                })?);
            }
            Some("category_id") => {
                let raw = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read category_id: {}", e))
                })?;
                category_id = Some(Uuid::parse_str(&raw).map_err(|_| {
                    AppError::Validation("category_id must be a UUID".to_string())
                })?);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::Validation("Missing filename".to_string()))?;
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read upload: {}", e))
                })?;
                file = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let (filename, data) = file
        .ok_or_else(|| AppError::Validation("Missing file field".to_string()))?;

    if let Some(category) = category_id {
        let known = state.service_context.document_repo.list_categories().await?;
        if !known.iter().any(|c| c.id == category) {
            return Err(AppError::NotFound("Document category not found".to_string()));
        }
    }

    let saved = uploads::save_document(
        &state.settings.uploads.dir,
        &filename,
        &data,
        state.settings.uploads.max_file_bytes,
    )
    .await?;

    let now = Utc::now();
    let document = Document {
        id: Uuid::new_v4(),
        title: title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| filename.clone()),
        category_id,
        file_name: filename,
        file_url: saved.file_url,
        file_size: saved.file_size,
        storage_type: saved.storage_type,
        uploaded_by: Some(user.user.id),
        download_count: 0,
        created_at: now,
        updated_at: now,
    };

    let created = state.service_context.document_repo.create(document).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let document = state.service_context.document_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Document not found".to_string()))?;

    state.service_context.document_repo.delete(id).await?;

    uploads::delete_file_best_effort(state.settings.uploads.dir.clone(), document.file_url);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let download_count = state.service_context.document_repo.record_download(id).await?;

    Ok(Json(json!({ "ok": true, "download_count": download_count })))
}
