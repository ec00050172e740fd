//! Content resolver over PostgreSQL rows and a temporary data directory.

use std::sync::Arc;

use studyone_core::mock::MockWebpageFetcher;
use tempfile::TempDir;

use crate::test_fixtures::TestDatabase;
use crate::{
    ContentInput, ContentResolver, Error, FilesystemBackend, ItemContent, KnowledgeType,
    WebpageData,
};

fn resolver(test_db: &TestDatabase, dir: &TempDir) -> (ContentResolver, Arc<MockWebpageFetcher>) {
    let fetcher = Arc::new(MockWebpageFetcher::new());
    let backend = Arc::new(FilesystemBackend::new(dir.path()));
    (
        test_db.db.content_resolver(backend, fetcher.clone()),
        fetcher,
    )
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_markdown_hello_then_world() {
    let test_db = TestDatabase::new().await;
    let dir = TempDir::new().unwrap();
    let (resolver, _) = resolver(&test_db, &dir);
    let item = test_db.item("note", KnowledgeType::Markdown, None).await;

    resolver
        .set_content(item.id, ContentInput::Markdown("hello".into()))
        .await
        .unwrap();
    resolver
        .set_content(item.id, ContentInput::Markdown("world".into()))
        .await
        .unwrap();

    let Some(ItemContent::Markdown(md)) = resolver.get_content(item.id).await.unwrap() else {
        panic!("Expected markdown content");
    };
    assert_eq!(md.content.as_deref(), Some("world"));
    assert!(md.record.storage_path.starts_with("knowledge/markdown/"));

    let on_disk = std::fs::read_to_string(dir.path().join(&md.record.storage_path)).unwrap();
    assert_eq!(on_disk, "world");
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_webpage_type_mismatch_and_failed_fetch() {
    let test_db = TestDatabase::new().await;
    let dir = TempDir::new().unwrap();
    let (resolver, fetcher) = resolver(&test_db, &dir);
    let item = test_db.item("page", KnowledgeType::Webpage, None).await;

    let err = resolver
        .set_content(item.id, ContentInput::Markdown("text".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));

    let mut data = WebpageData::new("https://example.com");
    data.title = Some("Example".into());
    fetcher.respond_with("https://example.com", data.clone());
    fetcher.fail_with("https://example.com/slow", "timeout");

    resolver
        .fetch_and_set_webpage(item.id, "https://example.com")
        .await
        .unwrap();
    let err = resolver
        .fetch_and_set_webpage(item.id, "https://example.com/slow")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FetchFailure { .. }));

    let Some(ItemContent::Webpage(page)) = resolver.get_content(item.id).await.unwrap() else {
        panic!("Expected webpage content");
    };
    assert_eq!(page.data(), data);
    assert!(page.fetched_at_utc.is_some());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_delete_item_removes_bytes_and_rows() {
    let test_db = TestDatabase::new().await;
    let dir = TempDir::new().unwrap();
    let (resolver, _) = resolver(&test_db, &dir);
    let item = test_db.item("doomed", KnowledgeType::Markdown, None).await;

    let ItemContent::Markdown(md) = resolver
        .set_content(item.id, ContentInput::Markdown("bytes".into()))
        .await
        .unwrap()
    else {
        panic!("Expected markdown content");
    };

    resolver.delete_item(item.id).await.unwrap();

    assert!(!dir.path().join(&md.record.storage_path).exists());
    assert!(matches!(
        resolver.get_content(item.id).await,
        Err(Error::ItemNotFound(_))
    ));
}
