use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::map_db_error;
use crate::services::store::{self, AlertEvent};
use crate::state::AppState;

const MAX_ALERT_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertsQuery {
    pub severity: Option<String>,
    pub hostid: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AlertsResponse {
    pub count: usize,
    pub alerts: Vec<AlertEvent>,
}

#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "alerts",
    params(AlertsQuery),
    responses((status = 200, description = "Latest alert events", body = AlertsResponse))
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<AlertsResponse>, (StatusCode, String)> {
    let limit = query
        .limit
        .unwrap_or(state.config.alerts_default_limit)
        .clamp(1, MAX_ALERT_LIMIT) as i64;
    let severity = query
        .severity
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let hostid = query
        .hostid
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let alerts = store::fetch_alerts(&state.db, severity, hostid, limit)
        .await
        .map_err(map_db_error)?;
    Ok(Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/alerts", get(list_alerts))
}
