use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::map_db_error;
use crate::services::hierarchy::location::LOCATION_TABLE_VERSION;
use crate::services::hierarchy::types::{
    DeviceRecord, DeviceTypeDistribution, HealthStatus, InterfaceStatus,
};
use crate::services::hierarchy::{
    self, build_hierarchy, canonical_severity, matcher, place_device, scorer, DeviceSummary,
    HierarchyNode, LocationGroup,
};
use crate::services::store;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationsQuery {
    /// Restrict the snapshot to devices whose raw location contains this text.
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FiltersEcho {
    pub location: Option<String>,
}

/// Zeroed global rollup returned when the monitoring feed has no usable
/// location data, so dashboards render an explicit empty state instead of a
/// stale or missing one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GlobalHealth {
    pub total_devices: u32,
    pub healthy_count: u32,
    pub warning_count: u32,
    pub critical_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LocationsResponse {
    pub count: usize,
    pub total_devices: u32,
    pub locations: Vec<LocationGroup>,
    pub hierarchy: Vec<HierarchyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unclassified: Option<HierarchyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<GlobalHealth>,
    pub filters: FiltersEcho,
    pub table_version: u32,
    pub generated_at: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "locations",
    params(LocationsQuery),
    responses((status = 200, description = "Location hierarchy snapshot", body = LocationsResponse))
)]
pub async fn get_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<LocationsResponse>, (StatusCode, String)> {
    let (devices, offices) = tokio::try_join!(
        store::fetch_devices(&state.db),
        store::fetch_offices(&state.db)
    )
    .map_err(map_db_error)?;

    let filter = query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase);
    let devices: Vec<DeviceRecord> = match &filter {
        Some(needle) => devices
            .into_iter()
            .filter(|device| device.location.to_lowercase().contains(needle))
            .collect(),
        None => devices,
    };

    let snapshot = build_hierarchy(&devices, &offices);
    let empty = snapshot.is_empty();
    if empty {
        tracing::info!("no location data found in monitoring data");
    }
    Ok(Json(LocationsResponse {
        count: snapshot.hierarchy.len(),
        total_devices: snapshot.total_devices,
        locations: snapshot.locations,
        hierarchy: snapshot.hierarchy,
        unclassified: snapshot.unclassified,
        message: empty.then(|| "No location data found in monitoring data".to_string()),
        fallback: empty.then(GlobalHealth::default),
        filters: FiltersEcho {
            location: query.location,
        },
        table_version: LOCATION_TABLE_VERSION,
        generated_at: Utc::now(),
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProblemInterface {
    pub device_id: String,
    pub name: String,
    pub status: InterfaceStatus,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InterfaceReport {
    pub total: u32,
    pub up: u32,
    pub down: u32,
    pub idle: u32,
    pub unknown: u32,
    pub problematic: Vec<ProblemInterface>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OfficeDrilldownResponse {
    pub country: String,
    pub city: String,
    pub office: String,
    pub device_count: u32,
    pub healthy_count: u32,
    pub warning_count: u32,
    pub critical_count: u32,
    pub health_score: u8,
    pub status: HealthStatus,
    pub device_type_distribution: DeviceTypeDistribution,
    pub interface_monitoring: InterfaceReport,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    pub devices: Vec<DeviceSummary>,
    pub generated_at: DateTime<Utc>,
}

fn interface_report(devices: &[&DeviceRecord]) -> InterfaceReport {
    let mut report = InterfaceReport::default();
    for device in devices {
        for iface in &device.metrics.interfaces {
            report.total += 1;
            match iface.status {
                InterfaceStatus::Up => report.up += 1,
                InterfaceStatus::Down => report.down += 1,
                InterfaceStatus::Idle => report.idle += 1,
                InterfaceStatus::Unknown => report.unknown += 1,
            }
            let mut issues = Vec::new();
            let mut suggestions = Vec::new();
            if iface.status == InterfaceStatus::Down {
                issues.push("Interface is down".to_string());
                suggestions.push("Check cabling and port configuration".to_string());
            }
            if iface.errors_in + iface.errors_out > 0 {
                issues.push(format!(
                    "Interface errors detected ({} in / {} out)",
                    iface.errors_in, iface.errors_out
                ));
                suggestions.push("Inspect for duplex mismatch or failing optics".to_string());
            }
            if !issues.is_empty() {
                report.problematic.push(ProblemInterface {
                    device_id: device.device_id.clone(),
                    name: iface.name.clone(),
                    status: iface.status,
                    issues,
                    suggestions,
                });
            }
        }
    }
    report
}

#[utoipa::path(
    get,
    path = "/api/locations/{country}/{city}/{office}",
    tag = "locations",
    params(
        ("country" = String, Path, description = "Country name or slug"),
        ("city" = String, Path, description = "City name or slug"),
        ("office" = String, Path, description = "Office name or slug")
    ),
    responses(
        (status = 200, description = "Office drill-down", body = OfficeDrilldownResponse),
        (status = 404, description = "Office not found or has no devices")
    )
)]
pub async fn get_office_drilldown(
    State(state): State<AppState>,
    Path((country, city, office)): Path<(String, String, String)>,
) -> Result<Json<OfficeDrilldownResponse>, (StatusCode, String)> {
    let (devices, offices) = tokio::try_join!(
        store::fetch_devices(&state.db),
        store::fetch_offices(&state.db)
    )
    .map_err(map_db_error)?;

    let want = (
        matcher::normalize(&country),
        matcher::normalize(&city),
        matcher::normalize(&office),
    );
    let mut matched: Vec<(&DeviceRecord, hierarchy::location::ResolvedLocation)> = Vec::new();
    for device in &devices {
        let placed = place_device(device, &offices);
        let key = (
            matcher::normalize(&placed.country),
            matcher::normalize(&placed.city),
            matcher::normalize(&placed.office),
        );
        if key == want {
            matched.push((device, placed));
        }
    }
    if matched.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            "Office not found or has no devices".to_string(),
        ));
    }

    let display = matched[0].1.clone();
    let mut distribution = DeviceTypeDistribution::default();
    let mut healthy = 0;
    let mut warning = 0;
    let mut critical = 0;
    let mut offline = 0;
    let mut last_seen = None;
    let mut summaries = Vec::with_capacity(matched.len());
    for (device, _) in &matched {
        let health = scorer::score_device(&device.metrics);
        let severity = canonical_severity(device, &health);
        let device_type = hierarchy::location::classify_device(&device.device_id);
        distribution.record(device_type);
        match severity {
            hierarchy::types::Severity::Info => healthy += 1,
            hierarchy::types::Severity::Warning => warning += 1,
            hierarchy::types::Severity::Critical => critical += 1,
        }
        if health.overall == 0 {
            offline += 1;
        }
        last_seen = last_seen.max(device.last_seen);
        summaries.push(DeviceSummary {
            hostid: device.hostid.clone(),
            device_id: device.device_id.clone(),
            device_type,
            status: device
                .alert
                .as_ref()
                .map(|alert| alert.status.clone())
                .unwrap_or_else(|| "Operational".to_string()),
            severity,
            health,
            last_seen: device.last_seen,
        });
    }

    let device_refs: Vec<&DeviceRecord> = matched.iter().map(|(device, _)| *device).collect();
    let health_score = scorer::office_health_score(matched.len() as u32, offline, critical, warning);

    Ok(Json(OfficeDrilldownResponse {
        country: display.country,
        city: display.city,
        office: display.office,
        device_count: matched.len() as u32,
        healthy_count: healthy,
        warning_count: warning,
        critical_count: critical,
        health_score,
        status: HealthStatus::from_score(health_score),
        device_type_distribution: distribution,
        interface_monitoring: interface_report(&device_refs),
        last_seen,
        devices: summaries,
        generated_at: Utc::now(),
    }))
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckDevicesQuery {
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CheckDevicesResponse {
    pub has_devices: bool,
    pub device_count: u32,
    pub devices: Vec<String>,
    pub location: String,
    pub city: String,
    pub country: String,
}

#[utoipa::path(
    get,
    path = "/api/locations/check-devices",
    tag = "locations",
    params(CheckDevicesQuery),
    responses(
        (status = 200, description = "Whether monitored devices exist at a location", body = CheckDevicesResponse),
        (status = 400, description = "Missing location, city or country")
    )
)]
pub async fn check_devices(
    State(state): State<AppState>,
    Query(query): Query<CheckDevicesQuery>,
) -> Result<Json<CheckDevicesResponse>, (StatusCode, String)> {
    let required = |value: Option<String>, name: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("{name} query parameter is required"),
                )
            })
    };
    let location = required(query.location, "location")?;
    let city = required(query.city, "city")?;
    let country = required(query.country, "country")?;

    let devices = store::fetch_devices(&state.db).await.map_err(map_db_error)?;
    let location_norm = matcher::normalize(&location);
    let city_norm = matcher::normalize(&city);
    let country_norm = matcher::normalize(&country);
    let mut matched = Vec::new();
    for device in &devices {
        let device_location = matcher::normalize(&device.location);
        let by_text = !device_location.is_empty()
            && (device_location == location_norm || device_location.contains(&location_norm));
        if !by_text {
            continue;
        }
        let resolved =
            hierarchy::location::resolve_location(&device.location, device.geo.as_ref());
        if matcher::normalize(&resolved.city) == city_norm
            && matcher::normalize(&resolved.country) == country_norm
        {
            matched.push(device.device_id.clone());
        }
    }

    Ok(Json(CheckDevicesResponse {
        has_devices: !matched.is_empty(),
        device_count: matched.len() as u32,
        devices: matched,
        location,
        city,
        country,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locations", get(get_locations))
        .route("/locations/check-devices", get(check_devices))
        .route(
            "/locations/{country}/{city}/{office}",
            get(get_office_drilldown),
        )
}
