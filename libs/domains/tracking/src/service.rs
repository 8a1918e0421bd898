//! Tracking Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{TrackingError, TrackingResult};
use crate::kind::RecordKind;
use crate::models::{
    CreateRecord, GoalDetails, ListQuery, Page, Record, RecordStats, UpdateRecord, now,
};
use crate::repository::RecordRepository;

/// Operations on the records of one kind
///
/// Validates input, parses ids and shapes pages; persistence is left to the
/// repository.
pub struct TrackingService<R: RecordRepository> {
    repository: Arc<R>,
    kind: RecordKind,
}

impl<R: RecordRepository> TrackingService<R> {
    pub fn new(repository: R) -> Self {
        let kind = repository.kind();
        Self {
            repository: Arc::new(repository),
            kind,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Malformed ids cannot match any record, so they report NotFound
    fn parse_id(&self, id: &str) -> TrackingResult<Uuid> {
        Uuid::parse_str(id).map_err(|_| TrackingError::not_found(self.kind, id))
    }

    /// List records matching the query, newest first
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn list_records(&self, query: ListQuery) -> TrackingResult<Page<Record>> {
        let filter = query.filter(self.kind);
        let pagination = query.pagination();

        let (items, total_count) = tokio::try_join!(
            self.repository.list(filter.clone(), pagination),
            self.repository.count(filter),
        )?;

        Ok(Page::new(items, pagination, total_count))
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn get_record(&self, id: &str) -> TrackingResult<Record> {
        let uuid = self.parse_id(id)?;
        self.repository
            .find_by_id(uuid)
            .await?
            .ok_or_else(|| TrackingError::not_found(self.kind, id))
    }

    /// Trim, validate and persist a new record
    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn create_record(&self, input: CreateRecord) -> TrackingResult<Record> {
        let input = input.normalized();
        input.validate_for(self.kind)?;

        let record = Record::new(self.kind, input, now());
        self.repository.insert(record).await
    }

    /// Apply the non-blank fields of `input` in one atomic update
    #[instrument(skip(self, input), fields(kind = %self.kind))]
    pub async fn update_record(&self, id: &str, input: UpdateRecord) -> TrackingResult<Record> {
        let uuid = self.parse_id(id)?;

        let changes = input.into_changes(self.kind, now());
        changes.validate()?;

        self.repository
            .update(uuid, changes)
            .await?
            .ok_or_else(|| TrackingError::not_found(self.kind, id))
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn delete_record(&self, id: &str) -> TrackingResult<()> {
        let uuid = self.parse_id(id)?;

        if self.repository.delete(uuid).await? {
            Ok(())
        } else {
            Err(TrackingError::not_found(self.kind, id))
        }
    }

    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn stats(&self) -> TrackingResult<RecordStats> {
        self.repository.stats().await
    }

    /// A goal with the views and actions of the same visitor
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn goal_details(&self, id: &str) -> TrackingResult<GoalDetails> {
        if !self.kind.has_details() {
            return Err(TrackingError::Internal(format!(
                "{} records have no details",
                self.kind.label()
            )));
        }

        let uuid = self.parse_id(id)?;
        self.repository
            .goal_details(uuid)
            .await?
            .ok_or_else(|| TrackingError::not_found(self.kind, id))
    }
}

impl<R: RecordRepository> Clone for TrackingService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            kind: self.kind,
        }
    }
}
