//! Webpage content repository.
//!
//! Every write stamps `fetched_at_utc`; a refetch overwrites the same row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use studyone_core::{new_v7, Error, Result, WebpageContent, WebpageContentRepository, WebpageData};

const COLUMNS: &str = "id, knowledge_item_id, url, title, description, summary, keywords, \
                       fetched_at_utc, created_at_utc, updated_at_utc";

fn map_webpage(row: &PgRow) -> WebpageContent {
    WebpageContent {
        id: row.get("id"),
        knowledge_item_id: row.get("knowledge_item_id"),
        url: row.get("url"),
        title: row.get("title"),
        description: row.get("description"),
        summary: row.get("summary"),
        keywords: row.get("keywords"),
        fetched_at_utc: row.get("fetched_at_utc"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

/// PostgreSQL implementation of WebpageContentRepository.
pub struct PgWebpageContentRepository {
    pool: Pool<Postgres>,
}

impl PgWebpageContentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebpageContentRepository for PgWebpageContentRepository {
    async fn get_for_item(&self, item_id: Uuid) -> Result<Option<WebpageContent>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM webpage_content WHERE knowledge_item_id = $1",
            COLUMNS
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_webpage))
    }

    async fn insert(&self, item_id: Uuid, data: &WebpageData) -> Result<WebpageContent> {
        let row = sqlx::query(&format!(
            "INSERT INTO webpage_content
                 (id, knowledge_item_id, url, title, description, summary, keywords,
                  fetched_at_utc, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $8)
             RETURNING {}",
            COLUMNS
        ))
        .bind(new_v7())
        .bind(item_id)
        .bind(&data.url)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.summary)
        .bind(&data.keywords)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_webpage(&row))
    }

    async fn update_for_item(
        &self,
        item_id: Uuid,
        data: &WebpageData,
    ) -> Result<Option<WebpageContent>> {
        let row = sqlx::query(&format!(
            "UPDATE webpage_content
             SET url = $2, title = $3, description = $4, summary = $5, keywords = $6,
                 fetched_at_utc = $7, updated_at_utc = $7
             WHERE knowledge_item_id = $1
             RETURNING {}",
            COLUMNS
        ))
        .bind(item_id)
        .bind(&data.url)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.summary)
        .bind(&data.keywords)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_webpage))
    }

    async fn delete_for_item(&self, item_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM webpage_content WHERE knowledge_item_id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
