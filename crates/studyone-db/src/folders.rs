//! Folder repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use studyone_core::{
    new_v7, CreateFolderRequest, Error, Folder, FolderRepository, Result, UpdateFolderRequest,
};

const FOLDER_COLUMNS: &str = "id, name, parent_id, created_at_utc, updated_at_utc";

fn map_folder(row: &PgRow) -> Folder {
    Folder {
        id: row.get("id"),
        name: row.get("name"),
        parent_id: row.get("parent_id"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

/// PostgreSQL implementation of FolderRepository.
pub struct PgFolderRepository {
    pool: Pool<Postgres>,
}

impl PgFolderRepository {
    /// Create a new PgFolderRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn create(&self, req: CreateFolderRequest) -> Result<Folder> {
        let id = new_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO folder (id, name, parent_id, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {}",
            FOLDER_COLUMNS
        ))
        .bind(id)
        .bind(&req.name)
        .bind(req.parent_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_folder(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Folder>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM folder WHERE id = $1",
            FOLDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_folder))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM folder ORDER BY created_at_utc, id LIMIT $1 OFFSET $2",
            FOLDER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_folder).collect())
    }

    async fn list_by_parent(&self, parent_id: Option<Uuid>) -> Result<Vec<Folder>> {
        let rows = if let Some(pid) = parent_id {
            sqlx::query(&format!(
                "SELECT {} FROM folder WHERE parent_id = $1 ORDER BY created_at_utc, id",
                FOLDER_COLUMNS
            ))
            .bind(pid)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?
        } else {
            sqlx::query(&format!(
                "SELECT {} FROM folder WHERE parent_id IS NULL ORDER BY created_at_utc, id",
                FOLDER_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?
        };

        Ok(rows.iter().map(map_folder).collect())
    }

    async fn list_all(&self) -> Result<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM folder ORDER BY created_at_utc, id",
            FOLDER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_folder).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateFolderRequest) -> Result<Option<Folder>> {
        let set_parent = req.parent_id.is_some();
        let parent_id = req.parent_id.flatten();

        let row = sqlx::query(&format!(
            "UPDATE folder
             SET name = COALESCE($2, name),
                 parent_id = CASE WHEN $3 THEN $4 ELSE parent_id END,
                 updated_at_utc = $5
             WHERE id = $1
             RETURNING {}",
            FOLDER_COLUMNS
        ))
        .bind(id)
        .bind(req.name)
        .bind(set_parent)
        .bind(parent_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_folder))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Descendants go through ON DELETE CASCADE; their items through SET NULL.
        let result = sqlx::query("DELETE FROM folder WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
