//! MongoDB test infrastructure
//!
//! Provides a `TestMongo` helper that starts a MongoDB container for testing.

use mongodb::bson::doc;
use mongodb::{Client, Database};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;

/// Test MongoDB wrapper that ensures proper cleanup
///
/// The container is stopped and removed when this struct is dropped.
///
/// ```no_run
/// use test_utils::TestMongo;
///
/// # async fn example() {
/// let mongo = TestMongo::new().await;
/// let views = mongo.db().collection::<mongodb::bson::Document>("views");
/// # }
/// ```
pub struct TestMongo {
    #[allow(dead_code)]
    container: ContainerAsync<Mongo>,
    client: Client,
    db: Database,
    pub connection_string: String,
}

impl TestMongo {
    /// Start a standalone MongoDB and connect to a fresh `analytics_test` database.
    pub async fn new() -> Self {
        Self::with_database("analytics_test").await
    }

    pub async fn with_database(name: &str) -> Self {
        let container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");

        let host_port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");

        let connection_string = format!("mongodb://127.0.0.1:{}", host_port);

        let client = Client::with_uri_str(&connection_string)
            .await
            .expect("Failed to create MongoDB client");

        let db = client.database(name);
        db.run_command(doc! { "ping": 1 })
            .await
            .expect("MongoDB did not answer ping");

        tracing::info!(port = host_port, database = name, "Test MongoDB ready");

        Self {
            container,
            client,
            db,
            connection_string,
        }
    }

    /// Handle to the test database (cheap to clone)
    pub fn db(&self) -> Database {
        self.db.clone()
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl Drop for TestMongo {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test MongoDB container");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Document;

    #[tokio::test]
    async fn test_mongo_insert_find() {
        let mongo = TestMongo::new().await;
        let collection = mongo.db().collection::<Document>("smoke");

        collection
            .insert_one(doc! { "visitor": "user_1" })
            .await
            .unwrap();

        let found = collection
            .find_one(doc! { "visitor": "user_1" })
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(collection.count_documents(doc! {}).await.unwrap(), 1);

        let databases = mongo.client().list_database_names().await.unwrap();
        assert!(databases.iter().any(|name| name == "analytics_test"));
    }
}
