//! Record entity, request DTOs and response shapes

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::kind::RecordKind;

/// RFC 3339 in UTC with exactly three fractional digits.
///
/// Stored values are strings of a fixed shape, so ordering them as strings
/// orders them in time.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

/// Ids travel and are stored as hyphenated strings, never as BSON binary.
mod uuid_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&id.hyphenated())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(D::Error::custom)
    }
}

/// Current time at the stored precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn empty_meta() -> Value {
    Value::Object(Default::default())
}

/// `null`, `false`, zero and `""` count as absent; `{}` and `[]` do not.
fn provided_meta(meta: Option<Value>) -> Option<Value> {
    meta.filter(|value| match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// A tracked event: a page view, a user action or a goal conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// UUID v7, stored as `_id`
    #[serde(rename = "_id", with = "uuid_string")]
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    /// Site or app the event came from
    pub source: String,
    pub url: String,
    /// Opaque visitor identifier, shared across kinds
    pub visitor: String,
    /// Action name (actions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Goal name (goals only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Free-form JSON payload
    #[serde(default = "empty_meta")]
    #[schema(value_type = Object)]
    pub meta: Value,
    #[serde(with = "timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Build a new record from validated input.
    ///
    /// Label fields that do not belong to `kind` are dropped.
    pub fn new(kind: RecordKind, input: CreateRecord, now: DateTime<Utc>) -> Self {
        let (action, goal) = match kind {
            RecordKind::View => (None, None),
            RecordKind::Action => (input.action, None),
            RecordKind::Goal => (None, input.goal),
        };

        Self {
            id: Uuid::now_v7(),
            source: input.source.unwrap_or_default(),
            url: input.url.unwrap_or_default(),
            visitor: input.visitor.unwrap_or_default(),
            action,
            goal,
            meta: provided_meta(input.meta).unwrap_or_else(empty_meta),
            created_at: input.created_at.map_or(now, |at| at.trunc_subsecs(3)),
            updated_at: now,
        }
    }

    /// Value of the kind's label field
    pub fn label(&self, kind: RecordKind) -> Option<&str> {
        match kind {
            RecordKind::View => None,
            RecordKind::Action => self.action.as_deref(),
            RecordKind::Goal => self.goal.as_deref(),
        }
    }
}

/// Trim and drop blank values.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Body of `POST /{resource}`.
///
/// Every field is optional at the wire level so that a missing field is a
/// 400 validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecord {
    #[validate(required(message = "source is required"))]
    pub source: Option<String>,
    #[validate(required(message = "url is required"))]
    pub url: Option<String>,
    #[validate(required(message = "visitor is required"))]
    pub visitor: Option<String>,
    /// Required for actions, ignored otherwise
    pub action: Option<String>,
    /// Required for goals, ignored otherwise
    pub goal: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<Value>,
    /// Defaults to the time of creation
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateRecord {
    /// Trim string fields; blank values become `None`.
    pub fn normalized(self) -> Self {
        Self {
            source: clean(self.source),
            url: clean(self.url),
            visitor: clean(self.visitor),
            action: clean(self.action),
            goal: clean(self.goal),
            meta: self.meta,
            created_at: self.created_at,
        }
    }

    /// Validate the common fields plus the label field `kind` requires.
    ///
    /// Call on [`normalized`](Self::normalized) input so that whitespace-only
    /// values count as missing.
    pub fn validate_for(&self, kind: RecordKind) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if let Some(field) = kind.label_field() {
            let label = match kind {
                RecordKind::Action => &self.action,
                _ => &self.goal,
            };
            if label.is_none() {
                let mut error = ValidationError::new("required");
                error.message = Some(format!("{field} is required").into());
                errors.add(field, error);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Body of `PUT /{resource}/{id}`.
///
/// Only non-blank strings and a non-falsy `meta` replace stored values; an
/// empty string leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub source: Option<String>,
    pub url: Option<String>,
    pub visitor: Option<String>,
    pub action: Option<String>,
    pub goal: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<Value>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Field changes for one update, ready to apply atomically.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct RecordChanges {
    #[validate(length(min = 1, message = "source must not be empty"))]
    pub source: Option<String>,
    #[validate(length(min = 1, message = "url must not be empty"))]
    pub url: Option<String>,
    #[validate(length(min = 1, message = "visitor must not be empty"))]
    pub visitor: Option<String>,
    /// New value of the kind's label field
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub label: Option<String>,
    pub meta: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl UpdateRecord {
    /// Keep the provided, non-blank fields that apply to `kind`.
    pub fn into_changes(self, kind: RecordKind, now: DateTime<Utc>) -> RecordChanges {
        let label = match kind {
            RecordKind::View => None,
            RecordKind::Action => clean(self.action),
            RecordKind::Goal => clean(self.goal),
        };

        RecordChanges {
            source: clean(self.source),
            url: clean(self.url),
            visitor: clean(self.visitor),
            label,
            meta: provided_meta(self.meta),
            created_at: self.created_at.map(|at| at.trunc_subsecs(3)),
            updated_at: now,
        }
    }
}

/// Query string of `GET /{resource}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number, 1-based (default 1)
    pub page: Option<i64>,
    /// Page size (default 10)
    pub limit: Option<i64>,
    /// Exact match on source
    pub source: Option<String>,
    /// Exact match on visitor
    pub visitor: Option<String>,
    /// Exact match on url
    pub url: Option<String>,
    /// Exact match on action (actions only)
    pub action: Option<String>,
    /// Exact match on goal (goals only)
    pub goal: Option<String>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }

    /// Equality filters for `kind`; empty values and foreign labels are dropped.
    pub fn filter(&self, kind: RecordKind) -> RecordFilter {
        let label = match kind {
            RecordKind::View => None,
            RecordKind::Action => clean(self.action.clone()),
            RecordKind::Goal => clean(self.goal.clone()),
        };

        RecordFilter {
            source: clean(self.source.clone()),
            visitor: clean(self.visitor.clone()),
            url: clean(self.url.clone()),
            label,
        }
    }
}

/// Exact-match filters; `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub source: Option<String>,
    pub visitor: Option<String>,
    pub url: Option<String>,
    /// Value of the kind's label field
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u64 = 10;

    /// Page below 1 becomes 1; limit below 1 becomes the default.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).map_or(1, |p| p as u64);
        let limit = limit
            .filter(|l| *l >= 1)
            .map_or(Self::DEFAULT_LIMIT, |l| l as u64);
        Self { page, limit }
    }

    /// Records before this page, bounded by the largest skip MongoDB accepts
    pub fn skip(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
    pub current_page: u64,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total_count: u64) -> Self {
        Self {
            items,
            total_pages: pagination.total_pages(total_count),
            current_page: pagination.page,
            total_count,
        }
    }
}

/// A distinct label value and how many records carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValueCount {
    #[serde(alias = "_id")]
    pub value: String,
    pub count: u64,
}

/// Summary returned by `GET /{resource}/stats/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordStats {
    pub total_count: u64,
    pub unique_visitors: u64,
    pub unique_sources: u64,
    pub unique_urls: u64,
    /// Distinct label values (actions and goals)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_labels: Option<u64>,
    /// Ten most frequent labels, most frequent first (actions and goals)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popular_labels: Option<Vec<ValueCount>>,
    /// Every label with its count, most frequent first (goals only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_breakdown: Option<Vec<ValueCount>>,
}

/// A goal together with every view and action by the same visitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GoalDetails {
    pub goal: Record,
    pub views: Vec<Record>,
    pub actions: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

impl DeleteResponse {
    pub fn for_kind(kind: RecordKind) -> Self {
        Self {
            message: format!("{} deleted successfully", kind.label()),
        }
    }
}
