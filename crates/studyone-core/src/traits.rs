//! Core traits for study-one abstractions.
//!
//! These traits define the interfaces the relational store, the content
//! backend and the webpage fetcher must satisfy. The services in this crate
//! depend only on these traits, enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// FOLDER REPOSITORY TRAITS
// =============================================================================

/// Request for creating a folder.
#[derive(Debug, Clone)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// Request for updating a folder. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateFolderRequest {
    pub name: Option<String>,
    /// `Some(None)` moves the folder to the top level.
    pub parent_id: Option<Option<Uuid>>,
}

/// Repository for folder operations.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Create a new folder.
    async fn create(&self, req: CreateFolderRequest) -> Result<Folder>;

    /// Get a folder by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Folder>>;

    /// List folders with pagination.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Folder>>;

    /// List direct children of a parent (None = top-level folders).
    async fn list_by_parent(&self, parent_id: Option<Uuid>) -> Result<Vec<Folder>>;

    /// List every folder, unfiltered. Input for tree assembly.
    async fn list_all(&self) -> Result<Vec<Folder>>;

    /// Update a folder. Returns None if it does not exist.
    async fn update(&self, id: Uuid, req: UpdateFolderRequest) -> Result<Option<Folder>>;

    /// Delete a folder and its descendants, detaching their items.
    /// Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// KNOWLEDGE ITEM REPOSITORY TRAITS
// =============================================================================

/// Request for creating a knowledge item.
#[derive(Debug, Clone)]
pub struct CreateKnowledgeItemRequest {
    pub title: String,
    pub kind: KnowledgeType,
    pub folder_id: Option<Uuid>,
}

/// Request for updating a knowledge item. The type is immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateKnowledgeItemRequest {
    pub title: Option<String>,
    /// `Some(None)` detaches the item from its folder.
    pub folder_id: Option<Option<Uuid>>,
}

/// Request for listing knowledge items.
#[derive(Debug, Clone, Default)]
pub struct ListKnowledgeRequest {
    pub folder_id: Option<Uuid>,
    pub kind: Option<KnowledgeType>,
    /// Maximum results
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Repository for knowledge item operations.
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Insert a new knowledge item.
    async fn create(&self, req: CreateKnowledgeItemRequest) -> Result<KnowledgeItem>;

    /// Fetch an item by ID.
    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeItem>>;

    /// Fetch an item with its full current tag set.
    async fn get_with_tags(&self, id: Uuid) -> Result<Option<KnowledgeItemWithTags>>;

    /// List items filtered by folder and type.
    async fn list(&self, req: ListKnowledgeRequest) -> Result<Vec<KnowledgeItemWithTags>>;

    /// Case-insensitive match on title or on any attached tag name.
    async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeItemWithTags>>;

    /// Items carrying every one of the given tags.
    async fn list_by_tags(
        &self,
        tag_ids: &[Uuid],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeItemWithTags>>;

    /// Update title and/or folder. Returns None if the item does not exist.
    async fn update(
        &self,
        id: Uuid,
        req: UpdateKnowledgeItemRequest,
    ) -> Result<Option<KnowledgeItem>>;

    /// Delete an item with its content row, tag memberships and learning records.
    /// Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Request for creating a tag.
#[derive(Debug, Clone)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

/// Request for updating a tag.
#[derive(Debug, Clone, Default)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    /// `Some(None)` clears the color.
    pub color: Option<Option<String>>,
}

/// Repository for tag operations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a tag, or return the existing tag with the same name.
    async fn create(&self, req: CreateTagRequest) -> Result<Tag>;

    /// Get a tag by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Tag>>;

    /// Get a tag by exact name.
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// List tags with pagination.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Tag>>;

    /// Update a tag. Returns None if it does not exist.
    async fn update(&self, id: Uuid, req: UpdateTagRequest) -> Result<Option<Tag>>;

    /// Delete a tag and its memberships. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Add a membership edge. Returns false if it already existed.
    async fn add_to_item(&self, item_id: Uuid, tag_id: Uuid) -> Result<bool>;

    /// Remove a membership edge. Returns false if it was absent.
    async fn remove_from_item(&self, item_id: Uuid, tag_id: Uuid) -> Result<bool>;

    /// Tags currently attached to an item.
    async fn get_for_item(&self, item_id: Uuid) -> Result<Vec<Tag>>;
}

// =============================================================================
// CONTENT VARIANT REPOSITORY TRAITS
// =============================================================================

/// Repository for markdown pointer rows.
#[async_trait]
pub trait MarkdownContentRepository: Send + Sync {
    /// The pointer row for an item, if written.
    async fn get_for_item(&self, item_id: Uuid) -> Result<Option<MarkdownContent>>;

    /// Insert the pointer row for an item.
    async fn insert(&self, item_id: Uuid, storage_path: &str) -> Result<MarkdownContent>;

    /// Refresh `updated_at_utc` on an existing row; the path never changes.
    async fn touch(&self, item_id: Uuid) -> Result<Option<MarkdownContent>>;

    /// Delete the pointer row. Returns false if there was none.
    async fn delete_for_item(&self, item_id: Uuid) -> Result<bool>;
}

/// Repository for inline webpage content rows.
#[async_trait]
pub trait WebpageContentRepository: Send + Sync {
    /// The content row for an item, if written.
    async fn get_for_item(&self, item_id: Uuid) -> Result<Option<WebpageContent>>;

    /// Insert the content row for an item, stamping `fetched_at_utc`.
    async fn insert(&self, item_id: Uuid, data: &WebpageData) -> Result<WebpageContent>;

    /// Overwrite every inline field and refresh `fetched_at_utc`.
    async fn update_for_item(
        &self,
        item_id: Uuid,
        data: &WebpageData,
    ) -> Result<Option<WebpageContent>>;

    /// Delete the content row. Returns false if there was none.
    async fn delete_for_item(&self, item_id: Uuid) -> Result<bool>;
}

// =============================================================================
// LEARNING RECORD REPOSITORY TRAITS
// =============================================================================

/// Request for appending a learning record.
#[derive(Debug, Clone)]
pub struct CreateLearningRecordRequest {
    pub knowledge_item_id: Uuid,
    pub question: String,
    pub answer: Option<String>,
    pub is_correct: Option<bool>,
}

/// Repository for learning records.
#[async_trait]
pub trait LearningRecordRepository: Send + Sync {
    /// Append a record.
    async fn create(&self, req: CreateLearningRecordRequest) -> Result<LearningRecord>;

    /// Get a record by ID.
    async fn get(&self, id: Uuid) -> Result<Option<LearningRecord>>;

    /// Records for an item, oldest first.
    async fn list_for_item(
        &self,
        item_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LearningRecord>>;

    /// Delete a record. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// CONTENT BACKEND AND FETCHER TRAITS
// =============================================================================

/// Byte store addressed by opaque relative paths.
///
/// Allows abstracting over filesystem, object storage, or in-memory stores.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified path, replacing any previous bytes.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    ///
    /// A missing path is reported as `Error::Io` with `ErrorKind::NotFound`.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path. Deleting a missing path succeeds.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Fetches a URL and extracts page metadata.
#[async_trait]
pub trait WebpageFetcher: Send + Sync {
    /// Fetch `url`. Every failure is returned as `FetchOutcome::Failed`.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}
