use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    JsonBody, QueryParams,
    errors::responses::{
        BadRequestValidationResponse, InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::TrackingResult;
use crate::models::{
    CreateRecord, DeleteResponse, GoalDetails, ListQuery, Page, Record, RecordStats,
    UpdateRecord, ValueCount,
};
use crate::repository::RecordRepository;
use crate::service::TrackingService;

/// OpenAPI documentation shared by the views, actions and goals resources
#[derive(OpenApi)]
#[openapi(
    paths(
        list_records,
        create_record,
        get_record,
        update_record,
        delete_record,
        record_stats,
    ),
    components(
        schemas(Record, CreateRecord, UpdateRecord, RecordStats, ValueCount, DeleteResponse),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            InternalServerErrorResponse
        )
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation for the goal-only endpoints
#[derive(OpenApi)]
#[openapi(
    paths(goal_details),
    components(schemas(GoalDetails))
)]
pub struct GoalDetailsApiDoc;

/// Create the router for one record kind.
///
/// Goals additionally expose `/{id}/details`.
pub fn router<R: RecordRepository + 'static>(service: TrackingService<R>) -> Router {
    let has_details = service.kind().has_details();
    let shared_service = Arc::new(service);

    let router = Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/stats/summary", get(record_stats))
        .route("/{id}", get(get_record).put(update_record).delete(delete_record));

    let router = if has_details {
        router.route("/{id}/details", get(goal_details))
    } else {
        router
    };

    router.with_state(shared_service)
}

/// List records, newest first
#[utoipa::path(
    get,
    path = "",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of records", body = Page<Record>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_records<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    QueryParams(query): QueryParams<ListQuery>,
) -> TrackingResult<Json<Page<Record>>> {
    let page = service.list_records(query).await?;
    Ok(Json(page))
}

/// Record a new event
#[utoipa::path(
    post,
    path = "",
    request_body = CreateRecord,
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_record<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    JsonBody(input): JsonBody<CreateRecord>,
) -> TrackingResult<impl IntoResponse> {
    let record = service.create_record(input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get a record by ID
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record found", body = Record),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_record<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    Path(id): Path<String>,
) -> TrackingResult<Json<Record>> {
    let record = service.get_record(&id).await?;
    Ok(Json(record))
}

/// Update a record; blank fields are left unchanged
#[utoipa::path(
    put,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    request_body = UpdateRecord,
    responses(
        (status = 200, description = "Record updated", body = Record),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_record<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateRecord>,
) -> TrackingResult<Json<Record>> {
    let record = service.update_record(&id, input).await?;
    Ok(Json(record))
}

/// Delete a record
#[utoipa::path(
    delete,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record deleted", body = DeleteResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_record<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    Path(id): Path<String>,
) -> TrackingResult<Json<DeleteResponse>> {
    service.delete_record(&id).await?;
    Ok(Json(DeleteResponse::for_kind(service.kind())))
}

/// Aggregate counts over the whole collection
#[utoipa::path(
    get,
    path = "/stats/summary",
    responses(
        (status = 200, description = "Collection summary", body = RecordStats),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn record_stats<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
) -> TrackingResult<Json<RecordStats>> {
    let stats = service.stats().await?;
    Ok(Json(stats))
}

/// A goal with every view and action of its visitor
#[utoipa::path(
    get,
    path = "/{id}/details",
    params(
        ("id" = String, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Goal and visitor journey", body = GoalDetails),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn goal_details<R: RecordRepository>(
    State(service): State<Arc<TrackingService<R>>>,
    Path(id): Path<String>,
) -> TrackingResult<Json<GoalDetails>> {
    let details = service.goal_details(&id).await?;
    Ok(Json(details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::RecordKind;
    use crate::repository::MockRecordRepository;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(kind: RecordKind, setup: impl FnOnce(&mut MockRecordRepository)) -> Router {
        let mut mock = MockRecordRepository::new();
        mock.expect_kind().return_const(kind);
        setup(&mut mock);
        router(TrackingService::new(mock))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_201() {
        let app = app(RecordKind::View, |mock| {
            mock.expect_insert().returning(Ok);
        });

        let (status, body) = send(
            app,
            post_json("/", json!({"source": "web", "url": "/", "visitor": "v1"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["source"], "web");
        assert_eq!(body["meta"], json!({}));
        assert!(body["_id"].is_string());
    }

    #[tokio::test]
    async fn test_create_missing_field_is_400() {
        let app = app(RecordKind::Action, |mock| {
            mock.expect_insert().never();
        });

        let (status, body) = send(
            app,
            post_json("/", json!({"source": "web", "url": "/", "visitor": "v1"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request validation failed");
        assert!(body["details"]["action"].is_array());
    }

    #[tokio::test]
    async fn test_create_malformed_json_is_400() {
        let app = app(RecordKind::View, |_| {});
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_malformed_id_is_404() {
        let app = app(RecordKind::Goal, |_| {});
        let request = Request::builder()
            .uri("/not-an-id")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Goal not found");
    }

    #[tokio::test]
    async fn test_delete_returns_message() {
        let app = app(RecordKind::Action, |mock| {
            mock.expect_delete().returning(|_| Ok(true));
        });
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/{}", uuid::Uuid::now_v7()))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Action deleted successfully");
    }

    #[tokio::test]
    async fn test_list_invalid_page_is_400() {
        let app = app(RecordKind::View, |_| {});
        let request = Request::builder()
            .uri("/?page=abc")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_details_route_only_for_goals() {
        let id = uuid::Uuid::now_v7();

        let views = app(RecordKind::View, |_| {});
        let request = Request::builder()
            .uri(format!("/{id}/details"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(views, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let goals = app(RecordKind::Goal, |mock| {
            mock.expect_goal_details().returning(|_| Ok(None));
        });
        let request = Request::builder()
            .uri(format!("/{id}/details"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(goals, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Goal not found");
    }

    #[tokio::test]
    async fn test_stats_summary() {
        let app = app(RecordKind::View, |mock| {
            mock.expect_stats().returning(|| {
                Ok(RecordStats {
                    total_count: 2,
                    unique_visitors: 1,
                    unique_sources: 1,
                    unique_urls: 2,
                    ..Default::default()
                })
            });
        });
        let request = Request::builder()
            .uri("/stats/summary")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCount"], 2);
        assert!(body.get("popularLabels").is_none());
    }
}
