use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TrackingResult;
use crate::kind::RecordKind;
use crate::models::{GoalDetails, Pagination, Record, RecordChanges, RecordFilter, RecordStats};

/// Repository trait for the records of one [`RecordKind`]
///
/// Each instance is bound to a single kind and its collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Kind of record this repository stores
    fn kind(&self) -> RecordKind;

    /// Persist a new record
    async fn insert(&self, record: Record) -> TrackingResult<Record>;

    async fn find_by_id(&self, id: Uuid) -> TrackingResult<Option<Record>>;

    /// Newest first, one page
    async fn list(&self, filter: RecordFilter, pagination: Pagination) -> TrackingResult<Vec<Record>>;

    async fn count(&self, filter: RecordFilter) -> TrackingResult<u64>;

    /// Apply `changes` atomically and return the updated record, `None` if absent
    async fn update(&self, id: Uuid, changes: RecordChanges) -> TrackingResult<Option<Record>>;

    /// Returns whether a record was removed
    async fn delete(&self, id: Uuid) -> TrackingResult<bool>;

    async fn stats(&self) -> TrackingResult<RecordStats>;

    /// The goal plus every view and action by its visitor, `None` if absent
    async fn goal_details(&self, id: Uuid) -> TrackingResult<Option<GoalDetails>>;
}
