//! Extractors whose rejections use the [`AppError`](crate::AppError) JSON envelope.

pub mod json_body;
pub mod query_params;

pub use json_body::JsonBody;
pub use query_params::QueryParams;
