//! Learning history recorded against knowledge items.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::LearningRecord;
use crate::paging::page_bounds;
use crate::traits::{CreateLearningRecordRequest, KnowledgeRepository, LearningRecordRepository};

/// Append-only log of question/answer outcomes.
#[derive(Clone)]
pub struct LearningLog {
    items: Arc<dyn KnowledgeRepository>,
    records: Arc<dyn LearningRecordRepository>,
}

impl LearningLog {
    pub fn new(
        items: Arc<dyn KnowledgeRepository>,
        records: Arc<dyn LearningRecordRepository>,
    ) -> Self {
        Self { items, records }
    }

    /// Append a record for an existing item.
    pub async fn record(&self, req: CreateLearningRecordRequest) -> Result<LearningRecord> {
        if req.question.trim().is_empty() {
            return Err(Error::InvalidInput("Question cannot be empty".to_string()));
        }
        self.ensure_item(req.knowledge_item_id).await?;

        let record = self.records.create(req).await?;
        debug!(
            subsystem = "core",
            component = "learning",
            op = "record",
            item_id = %record.knowledge_item_id,
            "Learning record appended"
        );
        Ok(record)
    }

    /// Records for an item, oldest first.
    pub async fn history(
        &self,
        item_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<LearningRecord>> {
        self.ensure_item(item_id).await?;
        let (limit, offset) = page_bounds(limit, offset);
        self.records.list_for_item(item_id, limit, offset).await
    }

    pub async fn delete(&self, record_id: Uuid) -> Result<()> {
        if self.records.delete(record_id).await? {
            Ok(())
        } else {
            Err(Error::LearningRecordNotFound(record_id))
        }
    }

    async fn ensure_item(&self, item_id: Uuid) -> Result<()> {
        match self.items.get(item_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::ItemNotFound(item_id)),
        }
    }
}
