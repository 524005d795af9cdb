use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::json::JsonValue;
use crate::services::troubleshoot::{self, TroubleshootRequest};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TroubleshootResponse {
    pub analysis: JsonValue,
}

#[utoipa::path(
    post,
    path = "/api/troubleshoot",
    tag = "troubleshoot",
    request_body = TroubleshootRequest,
    responses(
        (status = 200, description = "Troubleshooting analysis", body = TroubleshootResponse),
        (status = 400, description = "Missing device or metric"),
        (status = 502, description = "Model call failed"),
        (status = 503, description = "Assistant not configured")
    )
)]
pub async fn troubleshoot_device(
    State(state): State<AppState>,
    Json(request): Json<TroubleshootRequest>,
) -> Result<Json<TroubleshootResponse>, (StatusCode, String)> {
    if request.device.trim().is_empty() || request.metric.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "device and metric are required".to_string(),
        ));
    }
    if state.config.gemini_api_key.is_none() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Troubleshooting assistant is not configured".to_string(),
        ));
    }

    let analysis = troubleshoot::analyze(&state.http, &state.config, &request)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, device = %request.device, "troubleshoot call failed");
            (StatusCode::BAD_GATEWAY, err.to_string())
        })?;
    Ok(Json(TroubleshootResponse {
        analysis: analysis.into(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/troubleshoot", post(troubleshoot_device))
}
