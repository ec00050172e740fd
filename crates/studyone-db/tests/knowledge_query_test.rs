//! Knowledge item listing, search and tag filtering against PostgreSQL.

use studyone_db::test_fixtures::{unique_name, TestDatabase};
use studyone_db::{
    CreateLearningRecordRequest, KnowledgeRepository, KnowledgeType, ListKnowledgeRequest,
    UpdateKnowledgeItemRequest,
};

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_search_matches_title_and_tag_name() {
    let test_db = TestDatabase::new().await;
    let marker = unique_name("needle");
    let by_title = test_db
        .item(&format!("About {}", marker), KnowledgeType::Markdown, None)
        .await;
    let by_tag = test_db.item("Unrelated title", KnowledgeType::Webpage, None).await;
    let tagger = test_db.db.tag_associator();
    tagger
        .add_tag_by_name(by_tag.id, &marker.to_uppercase())
        .await
        .unwrap();

    let hits = test_db.db.items.search(&marker, 20, 0).await.unwrap();
    let mut ids: Vec<_> = hits.iter().map(|h| h.item.id).collect();
    ids.sort();
    let mut expected = vec![by_title.id, by_tag.id];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_search_treats_wildcards_literally() {
    let test_db = TestDatabase::new().await;
    let marker = unique_name("pct");
    test_db
        .item(&format!("{} 100% sure", marker), KnowledgeType::Markdown, None)
        .await;

    let hits = test_db
        .db
        .items
        .search(&format!("{} 100%", marker), 20, 0)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    let none = test_db
        .db
        .items
        .search(&format!("{}%sure", marker), 20, 0)
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_list_by_tags_requires_all_tags() {
    let test_db = TestDatabase::new().await;
    let tagger = test_db.db.tag_associator();
    let a = tagger.create_tag(&unique_name("a"), None).await.unwrap();
    let b = tagger.create_tag(&unique_name("b"), None).await.unwrap();

    let both = test_db.item("both", KnowledgeType::Markdown, None).await;
    let only_a = test_db.item("only a", KnowledgeType::Markdown, None).await;
    tagger.add_tag(both.id, a.id).await.unwrap();
    tagger.add_tag(both.id, b.id).await.unwrap();
    tagger.add_tag(only_a.id, a.id).await.unwrap();

    let hits = test_db
        .db
        .items
        .list_by_tags(&[a.id, b.id], 20, 0)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.id, both.id);
    assert_eq!(hits[0].tags.len(), 2);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_list_filters_by_folder_and_type() {
    let test_db = TestDatabase::new().await;
    let folder = test_db.folder(&unique_name("inbox"), None).await;
    let md = test_db
        .item("md", KnowledgeType::Markdown, Some(folder.id))
        .await;
    test_db
        .item("web", KnowledgeType::Webpage, Some(folder.id))
        .await;

    let hits = test_db
        .db
        .items
        .list(ListKnowledgeRequest {
            folder_id: Some(folder.id),
            kind: Some(KnowledgeType::Markdown),
            limit: None,
            offset: None,
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.id, md.id);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_keeps_type_and_detaches_folder() {
    let test_db = TestDatabase::new().await;
    let folder = test_db.folder(&unique_name("f"), None).await;
    let item = test_db
        .item("before", KnowledgeType::Webpage, Some(folder.id))
        .await;

    let updated = test_db
        .db
        .items
        .update(
            item.id,
            UpdateKnowledgeItemRequest {
                title: Some("after".into()),
                folder_id: Some(None),
            },
        )
        .await
        .unwrap()
        .expect("item exists");
    assert_eq!(updated.title, "after");
    assert_eq!(updated.folder_id, None);
    assert_eq!(updated.kind, KnowledgeType::Webpage);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_item_delete_cascades_learning_records() {
    let test_db = TestDatabase::new().await;
    let log = test_db.db.learning_log();
    let item = test_db.item("quiz me", KnowledgeType::Markdown, None).await;

    let record = log
        .record(CreateLearningRecordRequest {
            knowledge_item_id: item.id,
            question: "What is a lifetime?".into(),
            answer: Some("A region of validity".into()),
            is_correct: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(log.history(item.id, None, None).await.unwrap().len(), 1);

    assert!(test_db.db.items.delete(item.id).await.unwrap());
    assert!(matches!(
        log.delete(record.id).await,
        Err(studyone_db::Error::LearningRecordNotFound(_))
    ));
}
