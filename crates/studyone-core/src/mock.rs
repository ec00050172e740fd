//! In-memory test doubles for the repository, backend and fetcher traits.
//!
//! `MockStore` implements every repository trait over one shared state, with
//! the same cascade rules as the PostgreSQL schema (folder deletes detach
//! items, item deletes remove content rows, memberships and learning records).
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use studyone_core::mock::{MockStorageBackend, MockStore, MockWebpageFetcher};
//! use studyone_core::ContentResolver;
//!
//! let store = Arc::new(MockStore::new());
//! let resolver = ContentResolver::new(
//!     store.clone(),
//!     store.clone(),
//!     store.clone(),
//!     Arc::new(MockStorageBackend::new()),
//!     Arc::new(MockWebpageFetcher::new()),
//! );
//! # let _ = resolver;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::*;
use crate::uuid_utils::new_v7;

#[derive(Default)]
struct MockState {
    folders: Vec<Folder>,
    items: Vec<KnowledgeItem>,
    tags: Vec<Tag>,
    memberships: Vec<(Uuid, Uuid, DateTime<Utc>)>,
    markdown: Vec<MarkdownContent>,
    webpages: Vec<WebpageContent>,
    records: Vec<LearningRecord>,
}

impl MockState {
    fn tags_for(&self, item_id: Uuid) -> Vec<Tag> {
        let ids: HashSet<Uuid> = self
            .memberships
            .iter()
            .filter(|(item, _, _)| *item == item_id)
            .map(|(_, tag, _)| *tag)
            .collect();
        let mut tags: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    fn with_tags(&self, item: &KnowledgeItem) -> KnowledgeItemWithTags {
        KnowledgeItemWithTags {
            item: item.clone(),
            tags: self.tags_for(item.id),
        }
    }

    /// Newest first, matching the SQL ordering.
    fn page_items<'a, I>(&self, items: I, limit: i64, offset: i64) -> Vec<KnowledgeItemWithTags>
    where
        I: DoubleEndedIterator<Item = &'a KnowledgeItem>,
    {
        items
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|item| self.with_tags(item))
            .collect()
    }
}

/// Shared in-memory relational store.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markdown pointer rows for an item.
    pub fn markdown_row_count(&self, item_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .markdown
            .iter()
            .filter(|m| m.knowledge_item_id == item_id)
            .count()
    }

    /// Insert a folder row verbatim, bypassing validation. Useful for
    /// constructing corrupted parent graphs.
    pub fn insert_folder_raw(&self, folder: Folder) {
        self.state.lock().unwrap().folders.push(folder);
    }
}

#[async_trait]
impl FolderRepository for MockStore {
    async fn create(&self, req: CreateFolderRequest) -> Result<Folder> {
        let now = Utc::now();
        let folder = Folder {
            id: new_v7(),
            name: req.name,
            parent_id: req.parent_id,
            created_at_utc: now,
            updated_at_utc: now,
        };
        self.state.lock().unwrap().folders.push(folder.clone());
        Ok(folder)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Folder>> {
        let state = self.state.lock().unwrap();
        Ok(state.folders.iter().find(|f| f.id == id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Folder>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .folders
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_by_parent(&self, parent_id: Option<Uuid>) -> Result<Vec<Folder>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .folders
            .iter()
            .filter(|f| f.parent_id == parent_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Folder>> {
        Ok(self.state.lock().unwrap().folders.clone())
    }

    async fn update(&self, id: Uuid, req: UpdateFolderRequest) -> Result<Option<Folder>> {
        let mut state = self.state.lock().unwrap();
        let Some(folder) = state.folders.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            folder.name = name;
        }
        if let Some(parent_id) = req.parent_id {
            folder.parent_id = parent_id;
        }
        folder.updated_at_utc = Utc::now();
        Ok(Some(folder.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if !state.folders.iter().any(|f| f.id == id) {
            return Ok(false);
        }

        let mut doomed = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for f in &state.folders {
                if f.parent_id.is_some_and(|p| doomed.contains(&p)) {
                    doomed.insert(f.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        state.folders.retain(|f| !doomed.contains(&f.id));
        for item in state.items.iter_mut() {
            if item.folder_id.is_some_and(|f| doomed.contains(&f)) {
                item.folder_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl KnowledgeRepository for MockStore {
    async fn create(&self, req: CreateKnowledgeItemRequest) -> Result<KnowledgeItem> {
        let now = Utc::now();
        let item = KnowledgeItem {
            id: new_v7(),
            title: req.title,
            kind: req.kind,
            folder_id: req.folder_id,
            created_at_utc: now,
            updated_at_utc: now,
        };
        self.state.lock().unwrap().items.push(item.clone());
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeItem>> {
        let state = self.state.lock().unwrap();
        Ok(state.items.iter().find(|i| i.id == id).cloned())
    }

    async fn get_with_tags(&self, id: Uuid) -> Result<Option<KnowledgeItemWithTags>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .find(|i| i.id == id)
            .map(|item| state.with_tags(item)))
    }

    async fn list(&self, req: ListKnowledgeRequest) -> Result<Vec<KnowledgeItemWithTags>> {
        let state = self.state.lock().unwrap();
        let (limit, offset) = crate::paging::page_bounds(req.limit, req.offset);
        let matching: Vec<&KnowledgeItem> = state
            .items
            .iter()
            .filter(|i| req.folder_id.is_none() || i.folder_id == req.folder_id)
            .filter(|i| req.kind.map_or(true, |k| i.kind == k))
            .collect();
        Ok(state.page_items(matching.into_iter(), limit, offset))
    }

    async fn search(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeItemWithTags>> {
        let state = self.state.lock().unwrap();
        let needle = query.to_lowercase();
        let matching: Vec<&KnowledgeItem> = state
            .items
            .iter()
            .filter(|i| {
                i.title.to_lowercase().contains(&needle)
                    || state
                        .tags_for(i.id)
                        .iter()
                        .any(|t| t.name.to_lowercase().contains(&needle))
            })
            .collect();
        Ok(state.page_items(matching.into_iter(), limit, offset))
    }

    async fn list_by_tags(
        &self,
        tag_ids: &[Uuid],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<KnowledgeItemWithTags>> {
        let state = self.state.lock().unwrap();
        let matching: Vec<&KnowledgeItem> = state
            .items
            .iter()
            .filter(|i| {
                tag_ids.iter().all(|tag| {
                    state
                        .memberships
                        .iter()
                        .any(|(item, t, _)| *item == i.id && t == tag)
                })
            })
            .collect();
        Ok(state.page_items(matching.into_iter(), limit, offset))
    }

    async fn update(
        &self,
        id: Uuid,
        req: UpdateKnowledgeItemRequest,
    ) -> Result<Option<KnowledgeItem>> {
        let mut state = self.state.lock().unwrap();
        let Some(item) = state.items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(title) = req.title {
            item.title = title;
        }
        if let Some(folder_id) = req.folder_id {
            item.folder_id = folder_id;
        }
        item.updated_at_utc = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.items.len();
        state.items.retain(|i| i.id != id);
        if state.items.len() == before {
            return Ok(false);
        }
        state.memberships.retain(|(item, _, _)| *item != id);
        state.markdown.retain(|m| m.knowledge_item_id != id);
        state.webpages.retain(|w| w.knowledge_item_id != id);
        state.records.retain(|r| r.knowledge_item_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TagRepository for MockStore {
    async fn create(&self, req: CreateTagRequest) -> Result<Tag> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.tags.iter().find(|t| t.name == req.name) {
            return Ok(existing.clone());
        }
        let tag = Tag {
            id: new_v7(),
            name: req.name,
            color: req.color,
            created_at_utc: Utc::now(),
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let state = self.state.lock().unwrap();
        Ok(state.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let state = self.state.lock().unwrap();
        Ok(state.tags.iter().find(|t| t.name == name).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Tag>> {
        let state = self.state.lock().unwrap();
        let mut tags = state.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update(&self, id: Uuid, req: UpdateTagRequest) -> Result<Option<Tag>> {
        let mut state = self.state.lock().unwrap();
        if let Some(name) = &req.name {
            if state.tags.iter().any(|t| t.id != id && &t.name == name) {
                return Err(Error::InvalidInput(format!("Tag name already in use: {}", name)));
            }
        }
        let Some(tag) = state.tags.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            tag.name = name;
        }
        if let Some(color) = req.color {
            tag.color = color;
        }
        Ok(Some(tag.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.tags.len();
        state.tags.retain(|t| t.id != id);
        state.memberships.retain(|(_, tag, _)| *tag != id);
        Ok(state.tags.len() != before)
    }

    async fn add_to_item(&self, item_id: Uuid, tag_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if state
            .memberships
            .iter()
            .any(|(item, tag, _)| *item == item_id && *tag == tag_id)
        {
            return Ok(false);
        }
        state.memberships.push((item_id, tag_id, Utc::now()));
        Ok(true)
    }

    async fn remove_from_item(&self, item_id: Uuid, tag_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.memberships.len();
        state
            .memberships
            .retain(|(item, tag, _)| !(*item == item_id && *tag == tag_id));
        Ok(state.memberships.len() != before)
    }

    async fn get_for_item(&self, item_id: Uuid) -> Result<Vec<Tag>> {
        Ok(self.state.lock().unwrap().tags_for(item_id))
    }
}

#[async_trait]
impl MarkdownContentRepository for MockStore {
    async fn get_for_item(&self, item_id: Uuid) -> Result<Option<MarkdownContent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .markdown
            .iter()
            .find(|m| m.knowledge_item_id == item_id)
            .cloned())
    }

    async fn insert(&self, item_id: Uuid, storage_path: &str) -> Result<MarkdownContent> {
        let mut state = self.state.lock().unwrap();
        if state.markdown.iter().any(|m| m.knowledge_item_id == item_id) {
            return Err(Error::Internal(format!(
                "Duplicate markdown content for item {}",
                item_id
            )));
        }
        let now = Utc::now();
        let record = MarkdownContent {
            id: new_v7(),
            knowledge_item_id: item_id,
            storage_path: storage_path.to_string(),
            created_at_utc: now,
            updated_at_utc: now,
        };
        state.markdown.push(record.clone());
        Ok(record)
    }

    async fn touch(&self, item_id: Uuid) -> Result<Option<MarkdownContent>> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .markdown
            .iter_mut()
            .find(|m| m.knowledge_item_id == item_id)
            .map(|m| {
                m.updated_at_utc = Utc::now();
                m.clone()
            }))
    }

    async fn delete_for_item(&self, item_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.markdown.len();
        state.markdown.retain(|m| m.knowledge_item_id != item_id);
        Ok(state.markdown.len() != before)
    }
}

#[async_trait]
impl WebpageContentRepository for MockStore {
    async fn get_for_item(&self, item_id: Uuid) -> Result<Option<WebpageContent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .webpages
            .iter()
            .find(|w| w.knowledge_item_id == item_id)
            .cloned())
    }

    async fn insert(&self, item_id: Uuid, data: &WebpageData) -> Result<WebpageContent> {
        let mut state = self.state.lock().unwrap();
        if state.webpages.iter().any(|w| w.knowledge_item_id == item_id) {
            return Err(Error::Internal(format!(
                "Duplicate webpage content for item {}",
                item_id
            )));
        }
        let now = Utc::now();
        let content = WebpageContent {
            id: new_v7(),
            knowledge_item_id: item_id,
            url: data.url.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            summary: data.summary.clone(),
            keywords: data.keywords.clone(),
            fetched_at_utc: Some(now),
            created_at_utc: now,
            updated_at_utc: now,
        };
        state.webpages.push(content.clone());
        Ok(content)
    }

    async fn update_for_item(
        &self,
        item_id: Uuid,
        data: &WebpageData,
    ) -> Result<Option<WebpageContent>> {
        let mut state = self.state.lock().unwrap();
        let Some(row) = state
            .webpages
            .iter_mut()
            .find(|w| w.knowledge_item_id == item_id)
        else {
            return Ok(None);
        };
        let now = Utc::now();
        row.url = data.url.clone();
        row.title = data.title.clone();
        row.description = data.description.clone();
        row.summary = data.summary.clone();
        row.keywords = data.keywords.clone();
        row.fetched_at_utc = Some(now);
        row.updated_at_utc = now;
        Ok(Some(row.clone()))
    }

    async fn delete_for_item(&self, item_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.webpages.len();
        state.webpages.retain(|w| w.knowledge_item_id != item_id);
        Ok(state.webpages.len() != before)
    }
}

#[async_trait]
impl LearningRecordRepository for MockStore {
    async fn create(&self, req: CreateLearningRecordRequest) -> Result<LearningRecord> {
        let record = LearningRecord {
            id: new_v7(),
            knowledge_item_id: req.knowledge_item_id,
            question: req.question,
            answer: req.answer,
            is_correct: req.is_correct,
            created_at_utc: Utc::now(),
        };
        self.state.lock().unwrap().records.push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LearningRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_item(
        &self,
        item_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<LearningRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .filter(|r| r.knowledge_item_id == item_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        Ok(state.records.len() != before)
    }
}

/// In-memory content backend.
#[derive(Default)]
pub struct MockStorageBackend {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored paths.
    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop bytes behind the store's back.
    pub fn remove(&self, path: &str) {
        self.files.lock().unwrap().remove(path);
    }
}

#[async_trait]
impl StorageBackend for MockStorageBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("No such path: {}", path),
                ))
            })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

/// Fetcher returning canned outcomes per URL.
///
/// URLs without a configured response fail with "no response configured".
#[derive(Default)]
pub struct MockWebpageFetcher {
    responses: Mutex<HashMap<String, FetchOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl MockWebpageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, url: &str, data: WebpageData) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), FetchOutcome::Fetched(data));
    }

    pub fn fail_with(&self, url: &str, error: &str) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            FetchOutcome::Failed {
                url: url.to_string(),
                error: error.to_string(),
            },
        );
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebpageFetcher for MockWebpageFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchOutcome::Failed {
                url: url.to_string(),
                error: "no response configured".to_string(),
            })
    }
}
