use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Document, DocumentCategory},
    error::{AppError, Result},
    repository::DocumentRepository,
};

#[derive(FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    slug: String,
    sort_order: i64,
}

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    title: String,
    category_id: Option<String>,
    file_name: String,
    file_url: String,
    file_size: i64,
    storage_type: String,
    uploaded_by: Option<String>,
    download_count: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

impl SqliteDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_category(row: CategoryRow) -> Result<DocumentCategory> {
        Ok(DocumentCategory {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
        })
    }

    fn row_to_document(row: DocumentRow) -> Result<Document> {
        Ok(Document {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            category_id: row.category_id
                .map(|c| Uuid::parse_str(&c).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            file_name: row.file_name,
            file_url: row.file_url,
            file_size: row.file_size,
            storage_type: row.storage_type,
            uploaded_by: row.uploaded_by
                .map(|u| Uuid::parse_str(&u).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            download_count: row.download_count,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    async fn create_category(&self, category: DocumentCategory) -> Result<DocumentCategory> {
        let id_str = category.id.to_string();

        sqlx::query(
            "INSERT INTO document_categories (id, name, slug, sort_order) VALUES (?, ?, ?, ?)"
        )
        .bind(&id_str)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.sort_order)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Category slug already exists: {}", category.slug))
            }
            _ => AppError::Database(e.to_string()),
        })?;

        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<DocumentCategory>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, sort_order FROM document_categories ORDER BY sort_order, name"
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn delete_category(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        // Documents in the category fall back to uncategorized (SET NULL).
        sqlx::query("DELETE FROM document_categories WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn create(&self, document: Document) -> Result<Document> {
        let id_str = document.id.to_string();
        let category_id_str = document.category_id.map(|c| c.to_string());
        let uploaded_by_str = document.uploaded_by.map(|u| u.to_string());
        let created_at_naive = document.created_at.naive_utc();
        let updated_at_naive = document.updated_at.naive_utc();

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, title, category_id, file_name, file_url, file_size,
                storage_type, uploaded_by, download_count, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&document.title)
        .bind(category_id_str)
        .bind(&document.file_name)
        .bind(&document.file_url)
        .bind(document.file_size)
        .bind(&document.storage_type)
        .bind(&uploaded_by_str)
        .bind(created_at_naive)
        .bind(updated_at_naive)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(document)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, title, category_id, file_name, file_url, file_size,
                   storage_type, uploaded_by, download_count, created_at, updated_at
            FROM documents
            WHERE id = ?
            "#
        )
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_document(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, category_id: Option<Uuid>, limit: i64, offset: i64) -> Result<Vec<Document>> {
        let rows = match category_id {
            Some(category) => {
                let category_str = category.to_string();
                sqlx::query_as::<_, DocumentRow>(
                    r#"
                    SELECT id, title, category_id, file_name, file_url, file_size,
                           storage_type, uploaded_by, download_count, created_at, updated_at
                    FROM documents
                    WHERE category_id = ?
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#
                )
                .bind(category_str)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, DocumentRow>(
                    r#"
                    SELECT id, title, category_id, file_name, file_url, file_size,
                           storage_type, uploaded_by, download_count, created_at, updated_at
                    FROM documents
                    ORDER BY created_at DESC
                    LIMIT ? OFFSET ?
                    "#
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn record_download(&self, id: Uuid) -> Result<i64> {
        let id_str = id.to_string();

        let result = sqlx::query(
            "UPDATE documents SET download_count = download_count + 1 WHERE id = ?"
        )
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT download_count FROM documents WHERE id = ?"
        )
        .bind(&id_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }
}
