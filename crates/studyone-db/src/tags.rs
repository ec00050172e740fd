//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use studyone_core::{
    new_v7, validate_tag_color, validate_tag_name, CreateTagRequest, Error, Result, Tag,
    TagRepository, UpdateTagRequest,
};

pub(crate) fn map_tag(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at_utc: row.get("created_at_utc"),
    }
}

fn map_unique_violation(e: sqlx::Error, name: &str) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::InvalidInput(format!("Tag name already in use: {}", name))
        }
        _ => Error::Database(e),
    }
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create(&self, req: CreateTagRequest) -> Result<Tag> {
        let name = validate_tag_name(&req.name).map_err(Error::InvalidInput)?;
        let color = validate_tag_color(req.color.as_deref()).map_err(Error::InvalidInput)?;

        let inserted = sqlx::query(
            "INSERT INTO tag (id, name, color, created_at_utc) VALUES ($1, $2, $3, $4)
             ON CONFLICT (name) DO NOTHING
             RETURNING id, name, color, created_at_utc",
        )
        .bind(new_v7())
        .bind(&name)
        .bind(color)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(row) = inserted {
            return Ok(map_tag(&row));
        }

        // Name already taken: hand back the existing tag
        self.get_by_name(&name)
            .await?
            .ok_or_else(|| Error::Internal(format!("Tag '{}' vanished after conflict", name)))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, color, created_at_utc FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_tag))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, color, created_at_utc FROM tag WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_tag))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, name, color, created_at_utc FROM tag
             ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_tag).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateTagRequest) -> Result<Option<Tag>> {
        let name = req
            .name
            .as_deref()
            .map(validate_tag_name)
            .transpose()
            .map_err(Error::InvalidInput)?;
        let set_color = req.color.is_some();
        let color = match req.color {
            Some(c) => validate_tag_color(c.as_deref()).map_err(Error::InvalidInput)?,
            None => None,
        };

        let row = sqlx::query(
            "UPDATE tag
             SET name = COALESCE($2, name),
                 color = CASE WHEN $3 THEN $4 ELSE color END
             WHERE id = $1
             RETURNING id, name, color, created_at_utc",
        )
        .bind(id)
        .bind(&name)
        .bind(set_color)
        .bind(color)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, name.as_deref().unwrap_or_default()))?;

        Ok(row.as_ref().map(map_tag))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Memberships cascade.
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_to_item(&self, item_id: Uuid, tag_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO knowledge_tag (knowledge_item_id, tag_id, created_at_utc)
             VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING",
        )
        .bind(item_id)
        .bind(tag_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_from_item(&self, item_id: Uuid, tag_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM knowledge_tag WHERE knowledge_item_id = $1 AND tag_id = $2")
                .bind(item_id)
                .bind(tag_id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_for_item(&self, item_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.color, t.created_at_utc
             FROM tag t
             JOIN knowledge_tag kt ON kt.tag_id = t.id
             WHERE kt.knowledge_item_id = $1
             ORDER BY t.name",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_tag).collect())
    }
}
