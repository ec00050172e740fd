//! Tag membership for knowledge items.
//!
//! Adding a tag that is already attached, or removing one that is not, is a
//! silent no-op. Both operations return the item with its current tag set.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{KnowledgeItemWithTags, Tag};
use crate::tags::{validate_tag_color, validate_tag_name};
use crate::traits::{CreateTagRequest, KnowledgeRepository, TagRepository, UpdateTagRequest};

/// Maintains the item/tag membership relation.
#[derive(Clone)]
pub struct TagAssociator {
    items: Arc<dyn KnowledgeRepository>,
    tags: Arc<dyn TagRepository>,
}

impl TagAssociator {
    pub fn new(items: Arc<dyn KnowledgeRepository>, tags: Arc<dyn TagRepository>) -> Self {
        Self { items, tags }
    }

    /// Attach a tag to an item.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` or `Error::TagNotFound` if either id
    /// does not resolve.
    pub async fn add_tag(&self, item_id: Uuid, tag_id: Uuid) -> Result<KnowledgeItemWithTags> {
        self.ensure_both_exist(item_id, tag_id).await?;
        let added = self.tags.add_to_item(item_id, tag_id).await?;
        debug!(
            subsystem = "core",
            component = "tagging",
            op = "add_tag",
            item_id = %item_id,
            tag_id = %tag_id,
            changed = added,
            "Tag membership applied"
        );
        self.current(item_id).await
    }

    /// Detach a tag from an item.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` or `Error::TagNotFound` if either id
    /// does not resolve.
    pub async fn remove_tag(&self, item_id: Uuid, tag_id: Uuid) -> Result<KnowledgeItemWithTags> {
        self.ensure_both_exist(item_id, tag_id).await?;
        let removed = self.tags.remove_from_item(item_id, tag_id).await?;
        debug!(
            subsystem = "core",
            component = "tagging",
            op = "remove_tag",
            item_id = %item_id,
            tag_id = %tag_id,
            changed = removed,
            "Tag membership removed"
        );
        self.current(item_id).await
    }

    /// Create (or reuse) a tag by name and attach it.
    pub async fn add_tag_by_name(
        &self,
        item_id: Uuid,
        name: &str,
    ) -> Result<KnowledgeItemWithTags> {
        let tag = self.create_tag(name, None).await?;
        self.add_tag(item_id, tag.id).await
    }

    /// Create a tag, returning the existing one when the name is taken.
    pub async fn create_tag(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        let name = validate_tag_name(name).map_err(Error::InvalidInput)?;
        let color = validate_tag_color(color).map_err(Error::InvalidInput)?;
        self.tags.create(CreateTagRequest { name, color }).await
    }

    /// Rename a tag and/or change its color. `Some(None)` clears the color.
    ///
    /// # Errors
    ///
    /// Returns `Error::TagNotFound` for an unknown id and
    /// `Error::InvalidInput` for an invalid or already used name.
    pub async fn update_tag(
        &self,
        tag_id: Uuid,
        name: Option<&str>,
        color: Option<Option<&str>>,
    ) -> Result<Tag> {
        let name = name
            .map(validate_tag_name)
            .transpose()
            .map_err(Error::InvalidInput)?;
        let color = color
            .map(validate_tag_color)
            .transpose()
            .map_err(Error::InvalidInput)?;
        self.tags
            .update(tag_id, UpdateTagRequest { name, color })
            .await?
            .ok_or(Error::TagNotFound(tag_id))
    }

    /// Delete a tag. Items that carried it simply lose it.
    pub async fn delete_tag(&self, tag_id: Uuid) -> Result<()> {
        if !self.tags.delete(tag_id).await? {
            return Err(Error::TagNotFound(tag_id));
        }
        debug!(
            subsystem = "core",
            component = "tagging",
            op = "delete_tag",
            tag_id = %tag_id,
            "Tag deleted"
        );
        Ok(())
    }

    async fn ensure_both_exist(&self, item_id: Uuid, tag_id: Uuid) -> Result<()> {
        if self.items.get(item_id).await?.is_none() {
            return Err(Error::ItemNotFound(item_id));
        }
        if self.tags.get(tag_id).await?.is_none() {
            return Err(Error::TagNotFound(tag_id));
        }
        Ok(())
    }

    async fn current(&self, item_id: Uuid) -> Result<KnowledgeItemWithTags> {
        self.items
            .get_with_tags(item_id)
            .await?
            .ok_or(Error::ItemNotFound(item_id))
    }
}
