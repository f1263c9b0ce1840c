use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use service_advisor::workflows::maintenance::{
    predictive_router, PredictiveMaintenanceService, ServiceHistoryRepository,
};
use std::sync::Arc;

pub(crate) fn with_predictive_routes<R>(
    service: Arc<PredictiveMaintenanceService<R>>,
) -> axum::Router
where
    R: ServiceHistoryRepository + 'static,
{
    predictive_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryHistoryRepository;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use service_advisor::workflows::maintenance::{JsonFileRepository, StoredServiceRecord};
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn app(ready: bool) -> axum::Router {
        let repository = InMemoryHistoryRepository::with_records(vec![StoredServiceRecord {
            record_id: "R1".to_string(),
            customer_id: "C1".to_string(),
            vin: "VIN1".to_string(),
            date: Some("2025-05-10".to_string()),
            service_codes_performed: Vec::new(),
            mileage_km: Some(31_000.0),
            issues_reported: vec!["AC not cooling".to_string()],
        }]);
        let service = Arc::new(PredictiveMaintenanceService::new(Arc::new(repository)));
        with_predictive_routes(service).layer(Extension(app_state(ready)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn ready_tracks_readiness_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "initializing");

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_use_prometheus_content_type() {
        let response = app(true)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn predictive_route_is_mounted() {
        let request = Request::post("/api/v1/predictive")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"customer_id":"C1","vin":"VIN1"}"#))
            .unwrap();
        let response = app(true).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let codes: Vec<_> = body["recommendations"]
            .as_array()
            .expect("recommendations array")
            .iter()
            .map(|rec| rec["service_code"].as_str().unwrap_or_default().to_string())
            .collect();
        assert!(codes.contains(&"PERIODIC_30K".to_string()));
        assert!(codes.contains(&"AC_CHECK".to_string()));
    }

    #[tokio::test]
    async fn unreadable_data_dir_returns_server_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("service_history.json"), "not json")
            .expect("fixture written");
        let service = Arc::new(PredictiveMaintenanceService::new(Arc::new(
            JsonFileRepository::new(dir.path()),
        )));
        let app = with_predictive_routes(service).layer(Extension(app_state(true)));

        let request = Request::post("/api/v1/predictive")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"customer_id":"C1","vin":"VIN1"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Failed to run predictive maintenance");
    }
}
