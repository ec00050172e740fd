//! Tag reuse-on-conflict and idempotent membership against PostgreSQL.

use studyone_db::test_fixtures::{unique_name, TestDatabase};
use studyone_db::{
    CreateTagRequest, Error, KnowledgeRepository, KnowledgeType, TagRepository, UpdateTagRequest,
};

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_tag_reuses_existing_name() {
    let test_db = TestDatabase::new().await;
    let name = unique_name("rust");

    let first = test_db
        .db
        .tags
        .create(CreateTagRequest {
            name: name.clone(),
            color: Some("#dea584".into()),
        })
        .await
        .expect("create");
    let second = test_db
        .db
        .tags
        .create(CreateTagRequest {
            name: format!("  {}  ", name),
            color: None,
        })
        .await
        .expect("reuse");

    assert_eq!(first.id, second.id);
    assert_eq!(second.color.as_deref(), Some("#dea584"));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_create_tag_rejects_invalid_name() {
    let test_db = TestDatabase::new().await;
    let err = test_db
        .db
        .tags
        .create(CreateTagRequest {
            name: "x".repeat(101),
            color: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_add_and_remove_are_idempotent() {
    let test_db = TestDatabase::new().await;
    let tagger = test_db.db.tag_associator();
    let item = test_db.item("tagged", KnowledgeType::Markdown, None).await;
    let tag = tagger
        .create_tag(&unique_name("ownership"), None)
        .await
        .expect("tag");

    let once = tagger.add_tag(item.id, tag.id).await.expect("add");
    let twice = tagger.add_tag(item.id, tag.id).await.expect("add again");
    assert_eq!(once.tag_ids(), vec![tag.id]);
    assert_eq!(once.tag_ids(), twice.tag_ids());

    let removed = tagger.remove_tag(item.id, tag.id).await.expect("remove");
    assert!(removed.tags.is_empty());
    let again = tagger.remove_tag(item.id, tag.id).await.expect("remove again");
    assert!(again.tags.is_empty());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_deleting_tag_drops_memberships() {
    let test_db = TestDatabase::new().await;
    let tagger = test_db.db.tag_associator();
    let item = test_db.item("tagged", KnowledgeType::Webpage, None).await;
    let tag = tagger.create_tag(&unique_name("tmp"), None).await.unwrap();
    tagger.add_tag(item.id, tag.id).await.unwrap();

    assert!(test_db.db.tags.delete(tag.id).await.unwrap());
    let current = test_db
        .db
        .items
        .get_with_tags(item.id)
        .await
        .unwrap()
        .expect("item");
    assert!(current.tags.is_empty());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_rename_to_taken_name_is_invalid_input() {
    let test_db = TestDatabase::new().await;
    let tags = &test_db.db.tags;
    let a = tags
        .create(CreateTagRequest {
            name: unique_name("a"),
            color: None,
        })
        .await
        .unwrap();
    let b = tags
        .create(CreateTagRequest {
            name: unique_name("b"),
            color: None,
        })
        .await
        .unwrap();

    let err = tags
        .update(
            b.id,
            UpdateTagRequest {
                name: Some(a.name.clone()),
                color: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}
