//! Service banner at the root path

use axum::{Json, Router, extract::State, routing::get};
use core_config::AppInfo;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Banner {
    message: &'static str,
    version: &'static str,
}

pub fn router(app: AppInfo) -> Router {
    Router::new().route("/", get(banner)).with_state(app)
}

async fn banner(State(app): State<AppInfo>) -> Json<Banner> {
    Json(Banner {
        message: "Tracking REST API - MongoDB",
        version: app.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_banner() {
        let app = router(AppInfo {
            name: "tracking_api",
            version: "1.2.3",
        });
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"message": "Tracking REST API - MongoDB", "version": "1.2.3"})
        );
    }
}
