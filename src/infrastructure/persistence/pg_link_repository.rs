//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPreview, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use serde_json::json;

/// PostgreSQL repository for link storage and retrieval.
///
/// Queries are bound at runtime so the crate builds without a live
/// database; the schema lives in `migrations/`.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    short_code: String,
    destination_url: String,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    has_qr: bool,
    title: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link::new(
            r.id,
            r.short_code,
            r.destination_url,
            r.owner_id,
            r.created_at,
            r.updated_at,
            r.has_qr,
            r.title,
            r.description,
            r.thumbnail,
        )
    }
}

const LINK_COLUMNS: &str = "id, short_code, destination_url, owner_id, created_at, updated_at, \
                            has_qr, title, description, thumbnail";

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let row: LinkRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO links (short_code, destination_url, owner_id, has_qr)
            VALUES ($1, $2, $3, $4)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.short_code)
        .bind(&new_link.destination_url)
        .bind(&new_link.owner_id)
        .bind(new_link.has_qr)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, AppError> {
        let row: Option<LinkRow> = sqlx::query_as(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE short_code = $1
            "#
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE short_code = $1)")
                .bind(short_code)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn set_preview(&self, short_code: &str, preview: LinkPreview) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail = COALESCE($4, thumbnail),
                updated_at = now()
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .bind(&preview.title)
        .bind(&preview.description)
        .bind(&preview.thumbnail)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "short_code": short_code }),
            ));
        }

        Ok(())
    }
}
