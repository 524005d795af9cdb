use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::map_db_error;
use crate::services::hierarchy::types::{DeviceRecord, DeviceType, HealthScore, Severity};
use crate::services::hierarchy::{canonical_severity, scorer};
use crate::services::hierarchy::location::classify_device;
use crate::services::store;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceListEntry {
    pub hostid: String,
    pub device_id: String,
    pub device_type: DeviceType,
    pub location: String,
    pub status: String,
    pub severity: Severity,
    pub health: HealthScore,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DevicesResponse {
    pub count: usize,
    pub devices: Vec<DeviceListEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceDetailResponse {
    pub device: DeviceRecord,
    pub device_type: DeviceType,
    pub health: HealthScore,
}

fn list_entry(device: &DeviceRecord) -> DeviceListEntry {
    let health = scorer::score_device(&device.metrics);
    DeviceListEntry {
        hostid: device.hostid.clone(),
        device_id: device.device_id.clone(),
        device_type: classify_device(&device.device_id),
        location: device.location.clone(),
        status: device
            .alert
            .as_ref()
            .map(|alert| alert.status.clone())
            .unwrap_or_else(|| "Operational".to_string()),
        severity: canonical_severity(device, &health),
        health,
        last_seen: device.last_seen,
    }
}

#[utoipa::path(
    get,
    path = "/api/devices",
    tag = "devices",
    responses((status = 200, description = "Monitored devices", body = DevicesResponse))
)]
pub async fn list_devices(
    State(state): State<AppState>,
) -> Result<Json<DevicesResponse>, (StatusCode, String)> {
    let devices = store::fetch_devices(&state.db).await.map_err(map_db_error)?;
    let entries: Vec<DeviceListEntry> = devices.iter().map(list_entry).collect();
    Ok(Json(DevicesResponse {
        count: entries.len(),
        devices: entries,
    }))
}

#[utoipa::path(
    get,
    path = "/api/devices/{hostid}",
    tag = "devices",
    params(("hostid" = String, Path, description = "Monitoring host id")),
    responses(
        (status = 200, description = "Device detail", body = DeviceDetailResponse),
        (status = 404, description = "Unknown device")
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(hostid): Path<String>,
) -> Result<Json<DeviceDetailResponse>, (StatusCode, String)> {
    let device = store::fetch_device(&state.db, hostid.trim())
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Device not found".to_string()))?;
    let health = scorer::score_device(&device.metrics);
    Ok(Json(DeviceDetailResponse {
        device_type: classify_device(&device.device_id),
        health,
        device,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices))
        .route("/devices/{hostid}", get(get_device))
}
