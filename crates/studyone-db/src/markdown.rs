//! Markdown pointer row repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use studyone_core::{new_v7, Error, MarkdownContent, MarkdownContentRepository, Result};

const COLUMNS: &str = "id, knowledge_item_id, storage_path, created_at_utc, updated_at_utc";

fn map_markdown(row: &PgRow) -> MarkdownContent {
    MarkdownContent {
        id: row.get("id"),
        knowledge_item_id: row.get("knowledge_item_id"),
        storage_path: row.get("storage_path"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

/// PostgreSQL implementation of MarkdownContentRepository.
pub struct PgMarkdownContentRepository {
    pool: Pool<Postgres>,
}

impl PgMarkdownContentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarkdownContentRepository for PgMarkdownContentRepository {
    async fn get_for_item(&self, item_id: Uuid) -> Result<Option<MarkdownContent>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM markdown_content WHERE knowledge_item_id = $1",
            COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_markdown))
    }

    async fn insert(&self, item_id: Uuid, storage_path: &str) -> Result<MarkdownContent> {
        let row = sqlx::query(&format!(
            "INSERT INTO markdown_content
                 (id, knowledge_item_id, storage_path, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {}",
            COLUMNS
        ))
        .bind(new_v7())
        .bind(item_id)
        .bind(storage_path)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_markdown(&row))
    }

    async fn touch(&self, item_id: Uuid) -> Result<Option<MarkdownContent>> {
        let row = sqlx::query(&format!(
            "UPDATE markdown_content SET updated_at_utc = $2
             WHERE knowledge_item_id = $1
             RETURNING {}",
            COLUMNS
        ))
        .bind(item_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_markdown))
    }

    async fn delete_for_item(&self, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM markdown_content WHERE knowledge_item_id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
