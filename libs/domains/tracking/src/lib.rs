//! Tracking Domain
//!
//! Page views, user actions and goal conversions, each kind in its own
//! MongoDB collection and served by the same generic stack.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, one router per kind
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Normalization, validation, pagination
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Record, DTOs, stats
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tracking::{MongoRecordRepository, RecordKind, TrackingService, handlers};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("analytics");
//!
//! let repository = MongoRecordRepository::new(db, RecordKind::Goal);
//! repository.create_indexes().await?;
//!
//! let router = handlers::router(TrackingService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod kind;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{TrackingError, TrackingResult};
pub use handlers::{ApiDoc, GoalDetailsApiDoc};
pub use kind::RecordKind;
pub use models::{
    CreateRecord, GoalDetails, ListQuery, Page, Record, RecordStats, UpdateRecord, ValueCount,
};
pub use mongodb::MongoRecordRepository;
pub use repository::RecordRepository;
pub use service::TrackingService;
