use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use super::boundary::predict_from_str;
use super::repository::ServiceHistoryRepository;
use super::service::{PredictionRequest, PredictiveMaintenanceService, PredictiveServiceError};

/// Router builder exposing the predictive maintenance endpoints.
pub fn predictive_router<R>(service: Arc<PredictiveMaintenanceService<R>>) -> Router
where
    R: ServiceHistoryRepository + 'static,
{
    Router::new()
        .route("/api/v1/predictive", post(predict_handler::<R>))
        .route("/api/v1/predictive/compute", post(compute_handler))
        .with_state(service)
}

pub(crate) async fn predict_handler<R>(
    State(service): State<Arc<PredictiveMaintenanceService<R>>>,
    axum::Json(request): axum::Json<PredictionRequest>,
) -> Response
where
    R: ServiceHistoryRepository + 'static,
{
    // Repository lookups read from disk, so they stay off the async workers.
    let outcome =
        tokio::task::spawn_blocking(move || service.predict(&request, Utc::now())).await;

    let result = match outcome {
        Ok(result) => result,
        Err(join_error) => {
            error!(error = %join_error, "predictive maintenance task aborted");
            let payload = json!({
                "message": "Failed to run predictive maintenance",
                "error": join_error.to_string(),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    match result {
        Ok(reply) => (StatusCode::OK, axum::Json(reply)).into_response(),
        Err(PredictiveServiceError::MissingIdentifiers) => {
            let payload = json!({
                "message": "customer_id and vin are required",
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Err(other) => {
            error!(error = %other, "predictive maintenance failed");
            let payload = json!({
                "message": "Failed to run predictive maintenance",
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Raw payload in, boundary output out; malformed bodies still get a 200 fallback.
pub(crate) async fn compute_handler(body: String) -> Response {
    let response = predict_from_str(&body, Utc::now()).into_response();
    (StatusCode::OK, axum::Json(response)).into_response()
}
