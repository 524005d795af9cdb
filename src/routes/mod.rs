pub mod alerts;
pub mod devices;
pub mod health;
pub mod locations;
pub mod offices;
pub mod troubleshoot;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(devices::router())
                .merge(locations::router())
                .merge(alerts::router())
                .merge(offices::router())
                .merge(troubleshoot::router())
                .merge(crate::openapi::router()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = crate::config::NetmonConfig {
            database_url: "postgresql://postgres@localhost/postgres".to_string(),
            gemini_api_key: None,
            troubleshoot_base_url: "http://127.0.0.1:1".to_string(),
            troubleshoot_model: "test-model".to_string(),
            troubleshoot_timeout_seconds: 1,
            alerts_default_limit: 100,
        };
        let db = crate::db::connect_lazy(&config.database_url).expect("lazy pool");
        AppState {
            config,
            db,
            http: reqwest::Client::new(),
        }
    }

    #[tokio::test]
    async fn healthz_responds_ok() {
        let app = router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = router(test_state());
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn troubleshoot_without_api_key_is_unavailable() {
        let app = router(test_state());
        let body = serde_json::json!({
            "device": "SW-Floor2",
            "metric": "cpu_utilization",
            "value": 96.5,
            "severity": "warning"
        });
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/troubleshoot")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn troubleshoot_rejects_empty_device() {
        let app = router(test_state());
        let body = serde_json::json!({
            "device": "  ",
            "metric": "cpu_utilization",
            "value": 96.5,
            "severity": "warning"
        });
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/troubleshoot")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
