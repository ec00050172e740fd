//! Knowledge item repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use studyone_core::{
    new_v7, page_bounds, CreateKnowledgeItemRequest, Error, KnowledgeItem, KnowledgeItemWithTags,
    KnowledgeRepository, KnowledgeType, ListKnowledgeRequest, Result, Tag,
    UpdateKnowledgeItemRequest,
};

use crate::escape_like;

const ITEM_COLUMNS: &str = "k.id, k.title, k.type, k.folder_id, k.created_at_utc, k.updated_at_utc";

fn map_item(row: &PgRow) -> Result<KnowledgeItem> {
    let kind: String = row.get("type");
    Ok(KnowledgeItem {
        id: row.get("id"),
        title: row.get("title"),
        kind: kind.parse::<KnowledgeType>().map_err(Error::Internal)?,
        folder_id: row.get("folder_id"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    })
}

/// PostgreSQL implementation of KnowledgeRepository.
pub struct PgKnowledgeRepository {
    pool: Pool<Postgres>,
}

impl PgKnowledgeRepository {
    /// Create a new PgKnowledgeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Attach tags to a page of items with a single query.
    async fn with_tags(&self, rows: Vec<PgRow>) -> Result<Vec<KnowledgeItemWithTags>> {
        let items = rows.iter().map(map_item).collect::<Result<Vec<_>>>()?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let tag_rows = sqlx::query(
            r#"
            SELECT kt.knowledge_item_id, t.id, t.name, t.color, t.created_at_utc
            FROM knowledge_tag kt
            JOIN tag t ON t.id = kt.tag_id
            WHERE kt.knowledge_item_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut tags_by_item: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in &tag_rows {
            tags_by_item
                .entry(row.get("knowledge_item_id"))
                .or_default()
                .push(crate::tags::map_tag(row));
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let tags = tags_by_item.remove(&item.id).unwrap_or_default();
                KnowledgeItemWithTags { item, tags }
            })
            .collect())
    }
}

#[async_trait]
impl KnowledgeRepository for PgKnowledgeRepository {
    async fn create(&self, req: CreateKnowledgeItemRequest) -> Result<KnowledgeItem> {
        let id = new_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO knowledge_item AS k
                 (id, title, type, folder_id, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(&req.title)
        .bind(req.kind.as_str())
        .bind(req.folder_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        map_item(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeItem>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM knowledge_item k WHERE k.id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_item).transpose()
    }

    async fn get_with_tags(&self, id: Uuid) -> Result<Option<KnowledgeItemWithTags>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM knowledge_item k WHERE k.id = $1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(self
            .with_tags(row.into_iter().collect())
            .await?
            .into_iter()
            .next())
    }

    async fn list(&self, req: ListKnowledgeRequest) -> Result<Vec<KnowledgeItemWithTags>> {
        let (limit, offset) = page_bounds(req.limit, req.offset);

        let rows = sqlx::query(&format!(
            "SELECT {} FROM knowledge_item k
             WHERE ($1::uuid IS NULL OR k.folder_id = $1)
               AND ($2::text IS NULL OR k.type = $2)
             ORDER BY k.created_at_utc DESC, k.id DESC
             LIMIT $3 OFFSET $4",
            ITEM_COLUMNS
        ))
        .bind(req.folder_id)
        .bind(req.kind.map(|k| k.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.with_tags(rows).await
    }

    async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeItemWithTags>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(&format!(
            "SELECT {} FROM knowledge_item k
             WHERE k.title ILIKE $1
                OR EXISTS (
                    SELECT 1 FROM knowledge_tag kt
                    JOIN tag t ON t.id = kt.tag_id
                    WHERE kt.knowledge_item_id = k.id AND t.name ILIKE $1
                )
             ORDER BY k.created_at_utc DESC, k.id DESC
             LIMIT $2 OFFSET $3",
            ITEM_COLUMNS
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.with_tags(rows).await
    }

    async fn list_by_tags(
        &self,
        tag_ids: &[Uuid],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeItemWithTags>> {
        let mut wanted = tag_ids.to_vec();
        wanted.sort();
        wanted.dedup();

        let rows = sqlx::query(&format!(
            "SELECT {} FROM knowledge_item k
             WHERE (
                 SELECT COUNT(DISTINCT kt.tag_id) FROM knowledge_tag kt
                 WHERE kt.knowledge_item_id = k.id AND kt.tag_id = ANY($1)
             ) = $2
             ORDER BY k.created_at_utc DESC, k.id DESC
             LIMIT $3 OFFSET $4",
            ITEM_COLUMNS
        ))
        .bind(&wanted[..])
        .bind(wanted.len() as i64)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.with_tags(rows).await
    }

    async fn update(
        &self,
        id: Uuid,
        req: UpdateKnowledgeItemRequest,
    ) -> Result<Option<KnowledgeItem>> {
        let set_folder = req.folder_id.is_some();
        let folder_id = req.folder_id.flatten();

        let row = sqlx::query(&format!(
            "UPDATE knowledge_item AS k
             SET title = COALESCE($2, k.title),
                 folder_id = CASE WHEN $3 THEN $4 ELSE k.folder_id END,
                 updated_at_utc = $5
             WHERE k.id = $1
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(id)
        .bind(req.title)
        .bind(set_folder)
        .bind(folder_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_item).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Content rows, tag memberships and learning records cascade.
        let result = sqlx::query("DELETE FROM knowledge_item WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
