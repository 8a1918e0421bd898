//! Shared application state passed to the route builders.

use mongodb::{Client, Database};

/// Cloning is cheap: the driver types share one connection pool.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    pub mongo_client: Client,
    /// Database holding the `views`, `actions` and `goals` collections
    pub db: Database,
}
