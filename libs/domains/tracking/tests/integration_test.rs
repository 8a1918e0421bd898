//! Integration tests for the Tracking repository
//!
//! These run `MongoRecordRepository` against a real MongoDB to check:
//! - documents round-trip through BSON unchanged
//! - updates are applied in place and return the new document
//! - ordering and pagination come from the store

use domain_tracking::models::{Pagination, RecordChanges, RecordFilter, now};
use domain_tracking::*;
use ::mongodb::bson::{Document, doc};
use serde_json::json;
use test_utils::{TestDataBuilder, TestMongo, assertions::*};

fn record(kind: RecordKind, builder: &TestDataBuilder, visitor: &str) -> Record {
    let input = CreateRecord {
        source: Some("website".into()),
        url: Some(builder.url("home")),
        visitor: Some(builder.visitor(visitor)),
        action: Some("click".into()),
        goal: Some("signup".into()),
        meta: Some(json!({"tags": ["a", "b"], "nested": {"depth": 2}})),
        ..Default::default()
    };
    Record::new(kind, input, now())
}

#[tokio::test]
async fn test_insert_and_find_round_trip() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::Action);
    let builder = TestDataBuilder::from_test_name("repo_round_trip");

    let created = repo.insert(record(RecordKind::Action, &builder, "1")).await.unwrap();
    let found = repo.find_by_id(created.id).await.unwrap();
    let found = assert_some(found, "inserted action should exist");

    assert_eq!(found, created);
}

#[tokio::test]
async fn test_documents_store_string_ids_and_timestamps() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::Goal);
    let builder = TestDataBuilder::from_test_name("repo_wire_format");

    let created = repo.insert(record(RecordKind::Goal, &builder, "1")).await.unwrap();

    let raw = mongo
        .db()
        .collection::<Document>("goals")
        .find_one(doc! {})
        .await
        .unwrap();
    let raw = assert_some(raw, "raw goal document");

    assert_eq!(raw.get_str("_id").unwrap(), created.id.to_string());
    assert_eq!(raw.get_str("goal").unwrap(), "signup");
    assert!(raw.get_str("createdAt").unwrap().ends_with('Z'));
    assert!(!raw.contains_key("action"));
}

#[tokio::test]
async fn test_update_returns_post_update_document() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::Goal);
    let builder = TestDataBuilder::from_test_name("repo_update");

    let created = repo.insert(record(RecordKind::Goal, &builder, "1")).await.unwrap();
    let later = now();

    let changes = RecordChanges {
        source: None,
        url: None,
        visitor: None,
        label: Some("purchase".into()),
        meta: Some(json!({})),
        created_at: None,
        updated_at: later,
    };
    let updated = repo.update(created.id, changes.clone()).await.unwrap();
    let updated = assert_some(updated, "goal should be updated");

    assert_eq!(updated.goal.as_deref(), Some("purchase"));
    assert_eq!(updated.meta, json!({}));
    assert_eq!(updated.updated_at, later);
    assert_eq!(updated.source, created.source);
    assert_eq!(updated.created_at, created.created_at);

    let missing = repo.update(uuid::Uuid::now_v7(), changes).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::View);
    let builder = TestDataBuilder::from_test_name("repo_ordering");

    for (i, at) in ["2024-01-01T00:00:00Z", "2024-03-01T00:00:00Z", "2024-02-01T00:00:00Z"]
        .into_iter()
        .enumerate()
    {
        let mut view = record(RecordKind::View, &builder, &i.to_string());
        view.created_at = at.parse().unwrap();
        repo.insert(view).await.unwrap();
    }

    let page = repo
        .list(RecordFilter::default(), Pagination::new(Some(1), Some(2)))
        .await
        .unwrap();
    let months: Vec<String> = page
        .iter()
        .map(|view| view.created_at.format("%m").to_string())
        .collect();
    assert_eq!(months, ["03", "02"]);

    let rest = repo
        .list(RecordFilter::default(), Pagination::new(Some(2), Some(2)))
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);

    let visitor = RecordFilter {
        visitor: Some(builder.visitor("1")),
        ..Default::default()
    };
    assert_eq!(repo.count(visitor).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_reports_whether_removed() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::View);
    let builder = TestDataBuilder::from_test_name("repo_delete");

    let created = repo.insert(record(RecordKind::View, &builder, "1")).await.unwrap();

    assert!(repo.delete(created.id).await.unwrap());
    assert!(!repo.delete(created.id).await.unwrap());
    assert!(repo.find_by_id(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_indexes_is_repeatable() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::Action);

    repo.create_indexes().await.unwrap();
    repo.create_indexes().await.unwrap();

    let names = repo.collection().list_index_names().await.unwrap();
    assert!(names.iter().any(|name| name.starts_with("action_1")));
    assert!(names.iter().any(|name| name.starts_with("visitor_1")));
}

#[tokio::test]
async fn test_empty_goal_stats() {
    let mongo = TestMongo::new().await;
    let repo = MongoRecordRepository::new(mongo.db(), RecordKind::Goal);

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.total_count, 0);
    assert_eq!(stats.unique_labels, Some(0));
    assert_eq!(stats.popular_labels, Some(vec![]));
    assert_eq!(stats.label_breakdown, Some(vec![]));
}
