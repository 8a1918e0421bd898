//! MongoDB implementation of RecordRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Bson, Document, doc, from_bson, from_document, to_bson},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{TrackingError, TrackingResult};
use crate::kind::RecordKind;
use crate::models::{
    GoalDetails, Pagination, Record, RecordChanges, RecordFilter, RecordStats, ValueCount,
    timestamp,
};
use crate::repository::RecordRepository;

/// Size of the `popularLabels` list
const POPULAR_LABELS_LIMIT: i64 = 10;

/// MongoDB implementation of the RecordRepository for one record kind
#[derive(Clone)]
pub struct MongoRecordRepository {
    kind: RecordKind,
    collection: Collection<Record>,
}

impl MongoRecordRepository {
    /// Repository over the kind's own collection (`views`, `actions` or `goals`)
    ///
    /// ```ignore
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let goals = MongoRecordRepository::new(client.database("analytics"), RecordKind::Goal);
    /// ```
    pub fn new(db: Database, kind: RecordKind) -> Self {
        let collection = db.collection::<Record>(kind.collection());
        Self { kind, collection }
    }

    pub fn collection(&self) -> &Collection<Record> {
        &self.collection
    }

    /// Create the listing indexes; existing indexes are left as they are.
    #[instrument(skip(self), fields(collection = self.kind.collection()))]
    pub async fn create_indexes(&self) -> TrackingResult<()> {
        let models: Vec<IndexModel> = Self::index_keys(self.kind)
            .into_iter()
            .map(|keys| IndexModel::builder().keys(keys).build())
            .collect();

        self.collection.create_indexes(models).await?;

        tracing::info!("Indexes ensured");
        Ok(())
    }

    fn index_keys(kind: RecordKind) -> Vec<Document> {
        let mut fields = vec!["source", "visitor", "url"];
        fields.extend(kind.label_field());

        fields
            .into_iter()
            .map(|field| {
                let mut keys = Document::new();
                keys.insert(field, 1);
                keys.insert("createdAt", -1);
                keys
            })
            .collect()
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": id.hyphenated().to_string() }
    }

    /// Build a MongoDB filter document from RecordFilter
    fn build_filter(kind: RecordKind, filter: &RecordFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref source) = filter.source {
            doc.insert("source", source);
        }

        if let Some(ref visitor) = filter.visitor {
            doc.insert("visitor", visitor);
        }

        if let Some(ref url) = filter.url {
            doc.insert("url", url);
        }

        if let (Some(field), Some(label)) = (kind.label_field(), &filter.label) {
            doc.insert(field, label);
        }

        doc
    }

    /// Build the `$set` document for an update; always refreshes `updatedAt`.
    fn build_set(kind: RecordKind, changes: &RecordChanges) -> TrackingResult<Document> {
        let mut set = doc! { "updatedAt": timestamp::format(&changes.updated_at) };

        if let Some(ref source) = changes.source {
            set.insert("source", source);
        }

        if let Some(ref url) = changes.url {
            set.insert("url", url);
        }

        if let Some(ref visitor) = changes.visitor {
            set.insert("visitor", visitor);
        }

        if let (Some(field), Some(label)) = (kind.label_field(), &changes.label) {
            set.insert(field, label);
        }

        if let Some(ref meta) = changes.meta {
            set.insert("meta", to_bson(meta)?);
        }

        if let Some(ref created_at) = changes.created_at {
            set.insert("createdAt", timestamp::format(created_at));
        }

        Ok(set)
    }

    /// `[{$group}, {$sort: {count: -1}}, {$limit}]` over a label field
    fn label_counts_pipeline(field: &str, limit: Option<i64>) -> Vec<Document> {
        let mut pipeline = vec![
            doc! { "$group": { "_id": format!("${field}"), "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
        ];

        if let Some(limit) = limit {
            pipeline.push(doc! { "$limit": limit });
        }

        pipeline
    }

    /// Match one goal and join the views and actions of its visitor
    fn goal_details_pipeline(id: Uuid) -> Vec<Document> {
        let lookup = |kind: RecordKind| {
            doc! {
                "$lookup": {
                    "from": kind.collection(),
                    "localField": "visitor",
                    "foreignField": "visitor",
                    "as": kind.collection(),
                }
            }
        };

        vec![
            doc! { "$match": Self::id_filter(id) },
            lookup(RecordKind::View),
            lookup(RecordKind::Action),
        ]
    }

    async fn distinct_count(&self, field: &str) -> TrackingResult<u64> {
        let values = self.collection.distinct(field, doc! {}).await?;
        Ok(values.len() as u64)
    }

    async fn label_counts(&self, field: &str, limit: Option<i64>) -> TrackingResult<Vec<ValueCount>> {
        let cursor = self
            .collection
            .aggregate(Self::label_counts_pipeline(field, limit))
            .await?;
        let counts: Vec<ValueCount> = cursor.with_type::<ValueCount>().try_collect().await?;
        Ok(counts)
    }
}

/// Detach a joined array from an aggregation result
fn take_records(document: &mut Document, key: &str) -> TrackingResult<Vec<Record>> {
    match document.remove(key) {
        Some(records @ Bson::Array(_)) => Ok(from_bson(records)?),
        _ => Ok(Vec::new()),
    }
}

#[async_trait]
impl RecordRepository for MongoRecordRepository {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    #[instrument(skip(self, record), fields(kind = %self.kind, record_id = %record.id))]
    async fn insert(&self, record: Record) -> TrackingResult<Record> {
        self.collection.insert_one(&record).await?;

        tracing::info!("Record created successfully");
        Ok(record)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn find_by_id(&self, id: Uuid) -> TrackingResult<Option<Record>> {
        let record = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(record)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn list(&self, filter: RecordFilter, pagination: Pagination) -> TrackingResult<Vec<Record>> {
        let mongo_filter = Self::build_filter(self.kind, &filter);

        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .skip(pagination.skip())
            .limit(pagination.limit as i64)
            .build();

        let cursor = self
            .collection
            .find(mongo_filter)
            .with_options(options)
            .await?;
        let records: Vec<Record> = cursor.try_collect().await?;

        Ok(records)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn count(&self, filter: RecordFilter) -> TrackingResult<u64> {
        let mongo_filter = Self::build_filter(self.kind, &filter);
        let count = self.collection.count_documents(mongo_filter).await?;
        Ok(count)
    }

    #[instrument(skip(self, changes), fields(kind = %self.kind))]
    async fn update(&self, id: Uuid, changes: RecordChanges) -> TrackingResult<Option<Record>> {
        let set = Self::build_set(self.kind, &changes)?;

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection
            .find_one_and_update(Self::id_filter(id), doc! { "$set": set })
            .with_options(options)
            .await?;

        if updated.is_some() {
            tracing::info!(record_id = %id, "Record updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn delete(&self, id: Uuid) -> TrackingResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;

        if result.deleted_count == 0 {
            return Ok(false);
        }

        tracing::info!(record_id = %id, "Record deleted successfully");
        Ok(true)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn stats(&self) -> TrackingResult<RecordStats> {
        let (total_count, unique_visitors, unique_sources, unique_urls) = tokio::try_join!(
            async {
                self.collection
                    .count_documents(doc! {})
                    .await
                    .map_err(TrackingError::from)
            },
            self.distinct_count("visitor"),
            self.distinct_count("source"),
            self.distinct_count("url"),
        )?;

        let mut stats = RecordStats {
            total_count,
            unique_visitors,
            unique_sources,
            unique_urls,
            ..Default::default()
        };

        if let Some(field) = self.kind.label_field() {
            let (unique_labels, popular_labels) = tokio::try_join!(
                self.distinct_count(field),
                self.label_counts(field, Some(POPULAR_LABELS_LIMIT)),
            )?;
            stats.unique_labels = Some(unique_labels);
            stats.popular_labels = Some(popular_labels);

            if self.kind == RecordKind::Goal {
                stats.label_breakdown = Some(self.label_counts(field, None).await?);
            }
        }

        Ok(stats)
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    async fn goal_details(&self, id: Uuid) -> TrackingResult<Option<GoalDetails>> {
        let mut cursor = self
            .collection
            .aggregate(Self::goal_details_pipeline(id))
            .await?;

        let Some(mut document) = cursor.try_next().await? else {
            return Ok(None);
        };

        let views = take_records(&mut document, RecordKind::View.collection())?;
        let actions = take_records(&mut document, RecordKind::Action.collection())?;
        let goal: Record = from_document(document)?;

        tracing::debug!(
            views = views.len(),
            actions = actions.len(),
            "Visitor journey joined"
        );
        Ok(Some(GoalDetails {
            goal,
            views,
            actions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now;
    use serde_json::json;

    fn changes() -> RecordChanges {
        RecordChanges {
            source: None,
            url: None,
            visitor: None,
            label: None,
            meta: None,
            created_at: None,
            updated_at: now(),
        }
    }

    #[test]
    fn test_build_filter_empty() {
        let doc = MongoRecordRepository::build_filter(RecordKind::View, &RecordFilter::default());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_exact_fields() {
        let filter = RecordFilter {
            source: Some("website".into()),
            visitor: Some("user_1".into()),
            url: Some("/home".into()),
            label: Some("signup".into()),
        };
        let doc = MongoRecordRepository::build_filter(RecordKind::Goal, &filter);
        assert_eq!(
            doc,
            doc! { "source": "website", "visitor": "user_1", "url": "/home", "goal": "signup" }
        );
    }

    #[test]
    fn test_build_filter_ignores_label_for_views() {
        let filter = RecordFilter {
            label: Some("click".into()),
            ..Default::default()
        };
        let doc = MongoRecordRepository::build_filter(RecordKind::View, &filter);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_set_only_touches_provided_fields() {
        let changes = RecordChanges {
            url: Some("/new".into()),
            label: Some("submit".into()),
            meta: Some(json!({"step": 2})),
            ..changes()
        };
        let set = MongoRecordRepository::build_set(RecordKind::Action, &changes).unwrap();

        assert_eq!(set.get_str("url").unwrap(), "/new");
        assert_eq!(set.get_str("action").unwrap(), "submit");
        assert!(set.get_document("meta").is_ok());
        assert!(set.contains_key("updatedAt"));
        assert!(!set.contains_key("source"));
        assert!(!set.contains_key("createdAt"));
    }

    #[test]
    fn test_build_set_refreshes_updated_at_only() {
        let changes = changes();
        let set = MongoRecordRepository::build_set(RecordKind::View, &changes).unwrap();
        assert_eq!(
            set,
            doc! { "updatedAt": timestamp::format(&changes.updated_at) }
        );
    }

    #[test]
    fn test_id_filter_uses_hyphenated_string() {
        let id = Uuid::now_v7();
        let filter = MongoRecordRepository::id_filter(id);
        assert_eq!(filter.get_str("_id").unwrap(), id.to_string());
    }

    #[test]
    fn test_index_keys_per_kind() {
        assert_eq!(MongoRecordRepository::index_keys(RecordKind::View).len(), 3);

        let keys = MongoRecordRepository::index_keys(RecordKind::Action);
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[3], doc! { "action": 1, "createdAt": -1 });
    }

    #[test]
    fn test_label_counts_pipeline() {
        let popular = MongoRecordRepository::label_counts_pipeline("goal", Some(10));
        assert_eq!(
            popular,
            vec![
                doc! { "$group": { "_id": "$goal", "count": { "$sum": 1 } } },
                doc! { "$sort": { "count": -1 } },
                doc! { "$limit": 10_i64 },
            ]
        );

        let breakdown = MongoRecordRepository::label_counts_pipeline("goal", None);
        assert_eq!(breakdown.len(), 2);
    }

    #[test]
    fn test_goal_details_pipeline() {
        let id = Uuid::now_v7();
        let pipeline = MongoRecordRepository::goal_details_pipeline(id);

        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0], doc! { "$match": { "_id": id.to_string() } });
        assert_eq!(
            pipeline[1],
            doc! {
                "$lookup": {
                    "from": "views",
                    "localField": "visitor",
                    "foreignField": "visitor",
                    "as": "views",
                }
            }
        );
        assert_eq!(
            pipeline[2].get_document("$lookup").unwrap().get_str("from").unwrap(),
            "actions"
        );
    }

    #[test]
    fn test_take_records_missing_key() {
        let mut document = doc! { "goal": "signup" };
        assert!(take_records(&mut document, "views").unwrap().is_empty());
    }
}
