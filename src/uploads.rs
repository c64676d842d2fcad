use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Allowed image extensions for avatars and announcement images
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Allowed extensions for sales-support documents
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip",
    "jpg", "jpeg", "png",
];

/// Storage backend recorded on saved files. Only local disk is wired up;
/// the column exists so an external provider can be added without a
/// schema change.
pub const STORAGE_LOCAL: &str = "local";

pub struct SavedFile {
    pub file_url: String,
    pub file_size: i64,
    pub storage_type: String,
}

pub async fn save_image(uploads_dir: &str, filename: &str, data: &[u8], max_bytes: usize) -> Result<SavedFile> {
    save_file(uploads_dir, "images", filename, data, max_bytes, IMAGE_EXTENSIONS).await
}

pub async fn save_document(uploads_dir: &str, filename: &str, data: &[u8], max_bytes: usize) -> Result<SavedFile> {
    save_file(uploads_dir, "documents", filename, data, max_bytes, DOCUMENT_EXTENSIONS).await
}

/// Save an uploaded file under `<uploads_dir>/<subdir>/`.
/// Returns the relative URL path stored in the database
/// (e.g., "uploads/images/abc123.jpg").
async fn save_file(
    uploads_dir: &str,
    subdir: &str,
    filename: &str,
    data: &[u8],
    max_bytes: usize,
    allowed: &[&str],
) -> Result<SavedFile> {
    if data.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File too large (max {} bytes)",
            max_bytes
        )));
    }

    let extension = filename
        .rsplit('.')
        .next()
        .map(|s| s.to_lowercase())
        .ok_or_else(|| AppError::Validation("Invalid filename".to_string()))?;

    if !allowed.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid file type. Allowed: {}",
            allowed.join(", ")
        )));
    }

    let target_dir = PathBuf::from(uploads_dir).join(subdir);
    fs::create_dir_all(&target_dir).await.map_err(|e| {
        AppError::Internal(format!("Failed to create uploads directory: {}", e))
    })?;

    let new_filename = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = target_dir.join(&new_filename);

    let mut file = fs::File::create(&file_path).await.map_err(|e| {
        AppError::Internal(format!("Failed to create file: {}", e))
    })?;

    file.write_all(data).await.map_err(|e| {
        AppError::Internal(format!("Failed to write file: {}", e))
    })?;

    Ok(SavedFile {
        file_url: format!("{}/{}/{}", uploads_dir, subdir, new_filename),
        file_size: data.len() as i64,
        storage_type: STORAGE_LOCAL.to_string(),
    })
}

/// Delete a stored file by its URL path. Only touches local uploads;
/// anything else is left to its storage backend.
pub async fn delete_file(uploads_dir: &str, url_path: &str) -> Result<()> {
    if !url_path.starts_with(uploads_dir) {
        return Ok(());
    }

    let path = PathBuf::from(url_path);
    if path.exists() {
        fs::remove_file(&path).await.map_err(|e| {
            AppError::Internal(format!("Failed to delete file: {}", e))
        })?;
    }

    Ok(())
}

/// Fire-and-forget removal of a stale file (replaced avatar, deleted
/// attachment). The caller never awaits this; failures are logged and
/// swallowed.
pub fn delete_file_best_effort(uploads_dir: String, url_path: String) {
    tokio::spawn(async move {
        if let Err(e) = delete_file(&uploads_dir, &url_path).await {
            tracing::warn!("Best-effort cleanup of {} failed: {}", url_path, e);
        }
    });
}
