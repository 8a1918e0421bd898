use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// The three kinds of tracked record.
///
/// All kinds share the same fields; Action and Goal add one label field
/// (`action` / `goal`) that names what happened.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    View,
    Action,
    Goal,
}

impl RecordKind {
    /// MongoDB collection holding this kind
    pub fn collection(&self) -> &'static str {
        match self {
            RecordKind::View => "views",
            RecordKind::Action => "actions",
            RecordKind::Goal => "goals",
        }
    }

    /// Capitalised name used in messages, e.g. "Goal not found"
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::View => "View",
            RecordKind::Action => "Action",
            RecordKind::Goal => "Goal",
        }
    }

    /// Name of the discriminating field, if the kind has one
    pub fn label_field(&self) -> Option<&'static str> {
        match self {
            RecordKind::View => None,
            RecordKind::Action => Some("action"),
            RecordKind::Goal => Some("goal"),
        }
    }

    /// Whether `GET /{id}/details` (the visitor journey join) is served
    pub fn has_details(&self) -> bool {
        matches!(self, RecordKind::Goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_collections_are_distinct() {
        let collections: Vec<_> = RecordKind::iter().map(|k| k.collection()).collect();
        assert_eq!(collections, vec!["views", "actions", "goals"]);
    }

    #[test]
    fn test_label_fields() {
        assert_eq!(RecordKind::View.label_field(), None);
        assert_eq!(RecordKind::Action.label_field(), Some("action"));
        assert_eq!(RecordKind::Goal.label_field(), Some("goal"));
    }

    #[test]
    fn test_only_goals_have_details() {
        assert!(RecordKind::Goal.has_details());
        assert!(!RecordKind::View.has_details());
        assert!(!RecordKind::Action.has_details());
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(RecordKind::Action.to_string(), "action");
        assert_eq!(RecordKind::from_str("goal").unwrap(), RecordKind::Goal);
        assert_eq!(RecordKind::View.label(), "View");
    }
}
