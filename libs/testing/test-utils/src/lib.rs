//! Shared test utilities for domain testing
//!
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo", default)
//! - `TestDataBuilder`: deterministic test data generation (always available)
//! - `assertions`: custom assertion helpers (always available)
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let visitor = builder.visitor("main");
//!     let url = builder.url("pricing");
//! }
//! ```

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic randomization
///
/// Values derived from the same seed are identical across runs, while
/// different test names yield values that do not collide.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_view");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Visitor identifier, e.g. `visitor-12345-main`
    pub fn visitor(&self, suffix: &str) -> String {
        self.name("visitor", suffix)
    }

    /// Page URL on a per-test host, e.g. `https://test-12345.example.com/pricing`
    pub fn url(&self, path: &str) -> String {
        format!(
            "https://test-{}.example.com/{}",
            self.seed,
            path.trim_start_matches('/')
        )
    }

    /// Generic unique name: `test-<prefix>-<seed>-<suffix>`
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.name("source", "web"), "test-source-7-web");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that `values` never increase from one element to the next
    pub fn assert_sorted_desc<T: PartialOrd + std::fmt::Debug>(values: &[T], context: &str) {
        for pair in values.windows(2) {
            assert!(
                pair[0] >= pair[1],
                "{}: expected descending order, got {:?}",
                context,
                values
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.visitor("a"), builder2.visitor("a"));
        assert_eq!(builder1.url("/home"), "https://test-42.example.com/home");
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.visitor("main"), builder2.visitor("main"));
    }

    #[test]
    fn test_assert_sorted_desc_accepts_ties() {
        assertions::assert_sorted_desc(&[5, 3, 3, 1], "counts");
    }

    #[test]
    #[should_panic(expected = "descending")]
    fn test_assert_sorted_desc_panics() {
        assertions::assert_sorted_desc(&[1, 2], "counts");
    }
}
