//! Learning record repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use studyone_core::{
    new_v7, CreateLearningRecordRequest, Error, LearningRecord, LearningRecordRepository, Result,
};

const COLUMNS: &str = "id, knowledge_item_id, question, answer, is_correct, created_at_utc";

fn map_record(row: &PgRow) -> LearningRecord {
    LearningRecord {
        id: row.get("id"),
        knowledge_item_id: row.get("knowledge_item_id"),
        question: row.get("question"),
        answer: row.get("answer"),
        is_correct: row.get("is_correct"),
        created_at_utc: row.get("created_at_utc"),
    }
}

/// PostgreSQL implementation of LearningRecordRepository.
pub struct PgLearningRecordRepository {
    pool: Pool<Postgres>,
}

impl PgLearningRecordRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LearningRecordRepository for PgLearningRecordRepository {
    async fn create(&self, req: CreateLearningRecordRequest) -> Result<LearningRecord> {
        let row = sqlx::query(&format!(
            "INSERT INTO learning_record
                 (id, knowledge_item_id, question, answer, is_correct, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            COLUMNS
        ))
        .bind(new_v7())
        .bind(req.knowledge_item_id)
        .bind(&req.question)
        .bind(&req.answer)
        .bind(req.is_correct)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_record(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<LearningRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM learning_record WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_record))
    }

    async fn list_for_item(
        &self,
        item_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LearningRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM learning_record
             WHERE knowledge_item_id = $1
             ORDER BY created_at_utc, id
             LIMIT $2 OFFSET $3",
            COLUMNS
        ))
        .bind(item_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_record).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM learning_record WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
