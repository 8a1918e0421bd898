//! Record routes, one router per kind backed by its own collection.

use axum::Router;
use domain_tracking::{MongoRecordRepository, RecordKind, TrackingResult, TrackingService, handlers};
use mongodb::Database;
use strum::IntoEnumIterator;
use tracing::info;

use crate::state::AppState;

pub fn router(state: &AppState, kind: RecordKind) -> Router {
    let repository = MongoRecordRepository::new(state.db.clone(), kind);
    handlers::router(TrackingService::new(repository))
}

/// Create the lookup indexes of every collection
pub async fn init_indexes(db: &Database) -> TrackingResult<()> {
    for kind in RecordKind::iter() {
        MongoRecordRepository::new(db.clone(), kind)
            .create_indexes()
            .await?;
        info!(collection = kind.collection(), "Indexes ready");
    }
    Ok(())
}
