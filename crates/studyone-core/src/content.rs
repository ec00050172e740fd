//! Content resolution for knowledge items.
//!
//! Every item declares its type at creation. The resolver dispatches on that
//! type to the matching content variant:
//!
//! - `markdown`: a pointer row in the relational store plus the body bytes in
//!   the [`StorageBackend`]
//! - `webpage`: a single row holding the URL and extracted fields inline
//!
//! At most one variant row exists per item. Writes with the wrong content kind
//! fail with [`Error::TypeMismatch`] before anything is touched.
//!
//! Backend bytes and pointer rows are written in two steps with no spanning
//! transaction. A crash between the steps can leave an orphaned file or a
//! pointer with no bytes behind it; the missing-bytes case is tolerated on
//! read.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::defaults::MARKDOWN_DIR;
use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::{
    KnowledgeRepository, MarkdownContentRepository, StorageBackend, WebpageContentRepository,
    WebpageFetcher,
};

/// Generate a fresh backend path for a markdown body.
pub fn markdown_storage_path() -> String {
    format!("{}/{}.md", MARKDOWN_DIR, Uuid::new_v4())
}

/// Reads and writes the type-specific content of knowledge items.
#[derive(Clone)]
pub struct ContentResolver {
    items: Arc<dyn KnowledgeRepository>,
    markdown: Arc<dyn MarkdownContentRepository>,
    webpages: Arc<dyn WebpageContentRepository>,
    backend: Arc<dyn StorageBackend>,
    fetcher: Arc<dyn WebpageFetcher>,
}

impl ContentResolver {
    pub fn new(
        items: Arc<dyn KnowledgeRepository>,
        markdown: Arc<dyn MarkdownContentRepository>,
        webpages: Arc<dyn WebpageContentRepository>,
        backend: Arc<dyn StorageBackend>,
        fetcher: Arc<dyn WebpageFetcher>,
    ) -> Self {
        Self {
            items,
            markdown,
            webpages,
            backend,
            fetcher,
        }
    }

    async fn load_item(&self, item_id: Uuid) -> Result<KnowledgeItem> {
        self.items
            .get(item_id)
            .await?
            .ok_or(Error::ItemNotFound(item_id))
    }

    /// Resolve an item's content.
    ///
    /// Returns `Ok(None)` when the item exists but nothing has been written.
    ///
    /// # Errors
    ///
    /// Returns `Error::ItemNotFound` if the item does not exist.
    pub async fn get_content(&self, item_id: Uuid) -> Result<Option<ItemContent>> {
        let item = self.load_item(item_id).await?;
        self.content_for(&item).await
    }

    async fn content_for(&self, item: &KnowledgeItem) -> Result<Option<ItemContent>> {
        match item.kind {
            KnowledgeType::Markdown => {
                let Some(record) = self.markdown.get_for_item(item.id).await? else {
                    return Ok(None);
                };
                let content = self.read_markdown(&record).await?;
                Ok(Some(ItemContent::Markdown(MarkdownContentWithData {
                    record,
                    content,
                })))
            }
            KnowledgeType::Webpage => Ok(self
                .webpages
                .get_for_item(item.id)
                .await?
                .map(ItemContent::Webpage)),
        }
    }

    async fn read_markdown(&self, record: &MarkdownContent) -> Result<Option<String>> {
        match self.backend.read(&record.storage_path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.is_missing_file() => {
                warn!(
                    subsystem = "core",
                    component = "content",
                    op = "get_content",
                    item_id = %record.knowledge_item_id,
                    storage_path = %record.storage_path,
                    "Markdown pointer has no backing bytes"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Item metadata, tags and resolved content in one view.
    pub async fn get_detail(&self, item_id: Uuid) -> Result<KnowledgeItemDetail> {
        let with_tags = self
            .items
            .get_with_tags(item_id)
            .await?
            .ok_or(Error::ItemNotFound(item_id))?;
        let content = self.content_for(&with_tags.item).await?;
        Ok(KnowledgeItemDetail {
            item: with_tags.item,
            tags: with_tags.tags,
            content,
        })
    }

    /// Write content for an item, creating its variant row on first write.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if the item does not exist
    /// - `Error::TypeMismatch` if `input` does not match the item's type
    pub async fn set_content(&self, item_id: Uuid, input: ContentInput) -> Result<ItemContent> {
        let item = self.load_item(item_id).await?;
        check_kind(&item, input.kind())?;

        match input {
            ContentInput::Markdown(text) => self.write_markdown(item_id, text).await,
            ContentInput::Webpage(data) => self.write_webpage(item_id, &data).await,
        }
    }

    async fn write_markdown(&self, item_id: Uuid, text: String) -> Result<ItemContent> {
        let start = Instant::now();

        let record = match self.markdown.get_for_item(item_id).await? {
            Some(existing) => {
                debug!(
                    subsystem = "core",
                    component = "content",
                    op = "set_content",
                    item_id = %item_id,
                    storage_path = %existing.storage_path,
                    "Overwriting markdown bytes in place"
                );
                self.backend
                    .write(&existing.storage_path, text.as_bytes())
                    .await?;
                self.markdown.touch(item_id).await?.ok_or_else(|| {
                    Error::StorageInconsistency(format!(
                        "Markdown row for item {} vanished during write",
                        item_id
                    ))
                })?
            }
            None => {
                let path = markdown_storage_path();
                debug!(
                    subsystem = "core",
                    component = "content",
                    op = "set_content",
                    item_id = %item_id,
                    storage_path = %path,
                    "Allocating markdown content"
                );
                self.backend.write(&path, text.as_bytes()).await?;
                match self.markdown.insert(item_id, &path).await {
                    Ok(record) => record,
                    Err(e) => {
                        if let Err(cleanup) = self.backend.delete(&path).await {
                            warn!(
                                subsystem = "core",
                                component = "content",
                                op = "set_content",
                                storage_path = %path,
                                error = %cleanup,
                                "Failed to remove orphaned markdown bytes"
                            );
                        }
                        return Err(e);
                    }
                }
            }
        };

        info!(
            subsystem = "core",
            component = "content",
            op = "set_content",
            item_id = %item_id,
            item_type = "markdown",
            bytes = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Markdown content written"
        );

        Ok(ItemContent::Markdown(MarkdownContentWithData {
            record,
            content: Some(text),
        }))
    }

    async fn write_webpage(&self, item_id: Uuid, data: &WebpageData) -> Result<ItemContent> {
        if data.url.trim().is_empty() {
            return Err(Error::InvalidInput("Webpage URL cannot be empty".to_string()));
        }

        let content = match self.webpages.update_for_item(item_id, data).await? {
            Some(updated) => {
                debug!(
                    subsystem = "core",
                    component = "content",
                    op = "set_content",
                    item_id = %item_id,
                    "Updated existing webpage content"
                );
                updated
            }
            None => self.webpages.insert(item_id, data).await?,
        };

        info!(
            subsystem = "core",
            component = "content",
            op = "set_content",
            item_id = %item_id,
            item_type = "webpage",
            url = %content.url,
            "Webpage content written"
        );
        Ok(ItemContent::Webpage(content))
    }

    /// Fetch `url` and store the extracted fields as the item's webpage content.
    ///
    /// A failed fetch writes nothing.
    ///
    /// # Errors
    ///
    /// - `Error::ItemNotFound` if the item does not exist
    /// - `Error::TypeMismatch` if the item is not a webpage item
    /// - `Error::FetchFailure` if the fetcher reports an error
    pub async fn fetch_and_set_webpage(&self, item_id: Uuid, url: &str) -> Result<ItemContent> {
        let item = self.load_item(item_id).await?;
        check_kind(&item, KnowledgeType::Webpage)?;

        match self.fetcher.fetch(url).await {
            FetchOutcome::Fetched(data) => self.write_webpage(item_id, &data).await,
            FetchOutcome::Failed { url, error } => {
                warn!(
                    subsystem = "core",
                    component = "content",
                    op = "fetch_and_set_webpage",
                    item_id = %item_id,
                    url = %url,
                    error = %error,
                    "Webpage fetch failed; content unchanged"
                );
                Err(Error::FetchFailure {
                    url,
                    message: error,
                })
            }
        }
    }

    /// Remove an item's content. Markdown bytes go first, then the pointer row.
    ///
    /// Returns false if there was no content to remove.
    pub async fn delete_content(&self, item_id: Uuid) -> Result<bool> {
        let item = self.load_item(item_id).await?;
        self.delete_content_for(&item).await
    }

    async fn delete_content_for(&self, item: &KnowledgeItem) -> Result<bool> {
        match item.kind {
            KnowledgeType::Markdown => {
                let Some(record) = self.markdown.get_for_item(item.id).await? else {
                    return Ok(false);
                };
                match self.backend.delete(&record.storage_path).await {
                    Ok(()) => {}
                    Err(e) if e.is_missing_file() => {
                        warn!(
                            subsystem = "core",
                            component = "content",
                            op = "delete_content",
                            item_id = %item.id,
                            storage_path = %record.storage_path,
                            "Markdown bytes already gone"
                        );
                    }
                    Err(e) => return Err(e),
                }
                self.markdown.delete_for_item(item.id).await
            }
            KnowledgeType::Webpage => self.webpages.delete_for_item(item.id).await,
        }
    }

    /// Delete an item together with its content, tags and learning records.
    pub async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        let item = self.load_item(item_id).await?;
        self.delete_content_for(&item).await?;
        if !self.items.delete(item_id).await? {
            return Err(Error::ItemNotFound(item_id));
        }
        info!(
            subsystem = "core",
            component = "content",
            op = "delete_item",
            item_id = %item_id,
            item_type = item.kind.as_str(),
            "Knowledge item deleted"
        );
        Ok(())
    }
}

fn check_kind(item: &KnowledgeItem, actual: KnowledgeType) -> Result<()> {
    if item.kind == actual {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            item_id: item.id,
            expected: item.kind,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockStorageBackend, MockStore, MockWebpageFetcher};
    use crate::traits::CreateKnowledgeItemRequest;

    struct Fixture {
        store: Arc<MockStore>,
        backend: Arc<MockStorageBackend>,
        fetcher: Arc<MockWebpageFetcher>,
        resolver: ContentResolver,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MockStore::new());
        let backend = Arc::new(MockStorageBackend::new());
        let fetcher = Arc::new(MockWebpageFetcher::new());
        let resolver = ContentResolver::new(
            store.clone(),
            store.clone(),
            store.clone(),
            backend.clone(),
            fetcher.clone(),
        );
        Fixture {
            store,
            backend,
            fetcher,
            resolver,
        }
    }

    async fn create_item(store: &MockStore, kind: KnowledgeType) -> KnowledgeItem {
        KnowledgeRepository::create(
            store,
            CreateKnowledgeItemRequest {
                title: format!("{} item", kind),
                kind,
                folder_id: None,
            },
        )
        .await
        .unwrap()
    }

    fn markdown_text(content: &ItemContent) -> Option<&str> {
        match content {
            ItemContent::Markdown(md) => md.content.as_deref(),
            ItemContent::Webpage(_) => panic!("Expected markdown content"),
        }
    }

    fn page(url: &str, title: &str) -> WebpageData {
        WebpageData {
            url: url.to_string(),
            title: Some(title.to_string()),
            description: Some("desc".to_string()),
            summary: Some("summary".to_string()),
            keywords: Some("a,b".to_string()),
        }
    }

    #[test]
    fn test_markdown_storage_path_format() {
        let path = markdown_storage_path();
        assert!(path.starts_with("knowledge/markdown/"));
        assert!(path.ends_with(".md"));
        let stem = &path["knowledge/markdown/".len()..path.len() - 3];
        assert!(Uuid::parse_str(stem).is_ok());
        assert_ne!(path, markdown_storage_path());
    }

    #[tokio::test]
    async fn test_get_content_unknown_item_is_not_found() {
        let f = fixture();
        let err = f.resolver.get_content(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, Error::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_content_before_write_is_none() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;
        assert!(f.resolver.get_content(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_markdown_round_trip() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;

        let text = "# Ownership\n\nEach value has one owner.\n";
        f.resolver
            .set_content(item.id, ContentInput::Markdown(text.to_string()))
            .await
            .unwrap();

        let content = f.resolver.get_content(item.id).await.unwrap().unwrap();
        assert_eq!(markdown_text(&content), Some(text));
    }

    #[tokio::test]
    async fn test_markdown_rewrite_reuses_single_row_and_path() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;

        let first = f
            .resolver
            .set_content(item.id, ContentInput::Markdown("hello".into()))
            .await
            .unwrap();
        let second = f
            .resolver
            .set_content(item.id, ContentInput::Markdown("world".into()))
            .await
            .unwrap();

        let (ItemContent::Markdown(a), ItemContent::Markdown(b)) = (&first, &second) else {
            panic!("Expected markdown content");
        };
        assert_eq!(a.record.id, b.record.id);
        assert_eq!(a.record.storage_path, b.record.storage_path);
        assert!(b.record.updated_at_utc >= a.record.updated_at_utc);

        let content = f.resolver.get_content(item.id).await.unwrap().unwrap();
        assert_eq!(markdown_text(&content), Some("world"));
        assert_eq!(f.store.markdown_row_count(item.id), 1);
        assert_eq!(f.backend.len(), 1);
    }

    #[tokio::test]
    async fn test_type_mismatch_leaves_content_unchanged() {
        let f = fixture();
        let md = create_item(&f.store, KnowledgeType::Markdown).await;
        let web = create_item(&f.store, KnowledgeType::Webpage).await;

        f.resolver
            .set_content(md.id, ContentInput::Markdown("kept".into()))
            .await
            .unwrap();
        f.resolver
            .set_content(web.id, ContentInput::Webpage(page("https://a.test", "A")))
            .await
            .unwrap();

        let err = f
            .resolver
            .set_content(md.id, ContentInput::Webpage(page("https://b.test", "B")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: KnowledgeType::Markdown,
                actual: KnowledgeType::Webpage,
                ..
            }
        ));

        let err = f
            .resolver
            .set_content(web.id, ContentInput::Markdown("nope".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let md_content = f.resolver.get_content(md.id).await.unwrap().unwrap();
        assert_eq!(markdown_text(&md_content), Some("kept"));
        let ItemContent::Webpage(w) = f.resolver.get_content(web.id).await.unwrap().unwrap()
        else {
            panic!("Expected webpage content");
        };
        assert_eq!(w.url, "https://a.test");
        assert_eq!(f.backend.len(), 1);
    }

    #[tokio::test]
    async fn test_type_mismatch_on_fresh_item_writes_nothing() {
        let f = fixture();
        let web = create_item(&f.store, KnowledgeType::Webpage).await;

        let err = f
            .resolver
            .set_content(web.id, ContentInput::Markdown("text".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(f.resolver.get_content(web.id).await.unwrap().is_none());
        assert!(f.backend.is_empty());
    }

    #[tokio::test]
    async fn test_webpage_round_trip_and_overwrite() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Webpage).await;

        let first = page("https://example.com/one", "One");
        f.resolver
            .set_content(item.id, ContentInput::Webpage(first.clone()))
            .await
            .unwrap();
        let ItemContent::Webpage(stored) = f.resolver.get_content(item.id).await.unwrap().unwrap()
        else {
            panic!("Expected webpage content");
        };
        assert_eq!(stored.data(), first);
        assert!(stored.fetched_at_utc.is_some());

        let second = WebpageData::new("https://example.com/two");
        f.resolver
            .set_content(item.id, ContentInput::Webpage(second.clone()))
            .await
            .unwrap();
        let ItemContent::Webpage(updated) =
            f.resolver.get_content(item.id).await.unwrap().unwrap()
        else {
            panic!("Expected webpage content");
        };
        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.data(), second);
        assert!(updated.fetched_at_utc >= stored.fetched_at_utc);
    }

    #[tokio::test]
    async fn test_fetch_and_set_webpage_success() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Webpage).await;
        f.fetcher
            .respond_with("https://rust-lang.org", page("https://rust-lang.org", "Rust"));

        let content = f
            .resolver
            .fetch_and_set_webpage(item.id, "https://rust-lang.org")
            .await
            .unwrap();
        let ItemContent::Webpage(w) = content else {
            panic!("Expected webpage content");
        };
        assert_eq!(w.title.as_deref(), Some("Rust"));
        assert_eq!(f.fetcher.calls(), vec!["https://rust-lang.org".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_existing_content_unchanged() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Webpage).await;
        let original = page("https://example.com", "Original");
        f.resolver
            .set_content(item.id, ContentInput::Webpage(original.clone()))
            .await
            .unwrap();

        f.fetcher.fail_with("https://example.com/new", "timeout");
        let err = f
            .resolver
            .fetch_and_set_webpage(item.id, "https://example.com/new")
            .await
            .unwrap_err();
        match err {
            Error::FetchFailure { url, message } => {
                assert_eq!(url, "https://example.com/new");
                assert_eq!(message, "timeout");
            }
            other => panic!("Expected FetchFailure, got {:?}", other),
        }

        let ItemContent::Webpage(w) = f.resolver.get_content(item.id).await.unwrap().unwrap()
        else {
            panic!("Expected webpage content");
        };
        assert_eq!(w.data(), original);
    }

    #[tokio::test]
    async fn test_failed_fetch_on_fresh_item_creates_nothing() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Webpage).await;
        f.fetcher.fail_with("https://down.test", "connection refused");

        assert!(f
            .resolver
            .fetch_and_set_webpage(item.id, "https://down.test")
            .await
            .is_err());
        assert!(f.resolver.get_content(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_for_markdown_item_is_mismatch_without_network() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;

        let err = f
            .resolver
            .fetch_and_set_webpage(item.id, "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(f.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_bytes_are_tolerated_on_read() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;
        let written = f
            .resolver
            .set_content(item.id, ContentInput::Markdown("gone soon".into()))
            .await
            .unwrap();
        let ItemContent::Markdown(md) = written else {
            panic!("Expected markdown content");
        };
        f.backend.remove(&md.record.storage_path);

        let content = f.resolver.get_content(item.id).await.unwrap().unwrap();
        let ItemContent::Markdown(read) = content else {
            panic!("Expected markdown content");
        };
        assert_eq!(read.record.id, md.record.id);
        assert!(read.content.is_none());
    }

    #[tokio::test]
    async fn test_delete_content_removes_bytes_then_row() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;
        f.resolver
            .set_content(item.id, ContentInput::Markdown("bye".into()))
            .await
            .unwrap();

        assert!(f.resolver.delete_content(item.id).await.unwrap());
        assert!(f.backend.is_empty());
        assert!(f.resolver.get_content(item.id).await.unwrap().is_none());
        assert!(!f.resolver.delete_content(item.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_content_with_missing_bytes_succeeds() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;
        let ItemContent::Markdown(md) = f
            .resolver
            .set_content(item.id, ContentInput::Markdown("x".into()))
            .await
            .unwrap()
        else {
            panic!("Expected markdown content");
        };
        f.backend.remove(&md.record.storage_path);

        assert!(f.resolver.delete_content(item.id).await.unwrap());
        assert_eq!(f.store.markdown_row_count(item.id), 0);
    }

    #[tokio::test]
    async fn test_delete_item_cascades() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Markdown).await;
        f.resolver
            .set_content(item.id, ContentInput::Markdown("body".into()))
            .await
            .unwrap();

        f.resolver.delete_item(item.id).await.unwrap();
        assert!(f.backend.is_empty());
        assert!(matches!(
            f.resolver.get_content(item.id).await,
            Err(Error::ItemNotFound(_))
        ));
        assert!(matches!(
            f.resolver.delete_item(item.id).await,
            Err(Error::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_detail_includes_tags_and_content() {
        let f = fixture();
        let item = create_item(&f.store, KnowledgeType::Webpage).await;
        f.resolver
            .set_content(item.id, ContentInput::Webpage(page("https://x.test", "X")))
            .await
            .unwrap();

        let detail = f.resolver.get_detail(item.id).await.unwrap();
        assert_eq!(detail.item.id, item.id);
        assert!(detail.tags.is_empty());
        assert_eq!(
            detail.content.map(|c| c.kind()),
            Some(KnowledgeType::Webpage)
        );
    }
}
