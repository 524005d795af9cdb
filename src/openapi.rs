use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::json::JsonValue;
use crate::routes;
use crate::services::hierarchy;
use crate::services::store::AlertEvent;
use crate::services::troubleshoot::TroubleshootRequest;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "netmon-server-rs",
        description = "Network monitoring core server: location hierarchy, device health, office registry"
    ),
    paths(
        routes::health::healthz_handler,
        routes::devices::list_devices,
        routes::devices::get_device,
        routes::locations::get_locations,
        routes::locations::get_office_drilldown,
        routes::locations::check_devices,
        routes::alerts::list_alerts,
        routes::offices::create_office,
        routes::offices::list_offices,
        routes::offices::get_office,
        routes::offices::update_office,
        routes::offices::delete_office,
        routes::troubleshoot::troubleshoot_device,
    ),
    components(schemas(
        JsonValue,
        AlertEvent,
        TroubleshootRequest,
        routes::health::HealthResponse,
        routes::devices::DeviceListEntry,
        routes::devices::DevicesResponse,
        routes::devices::DeviceDetailResponse,
        routes::locations::FiltersEcho,
        routes::locations::GlobalHealth,
        routes::locations::LocationsResponse,
        routes::locations::ProblemInterface,
        routes::locations::InterfaceReport,
        routes::locations::OfficeDrilldownResponse,
        routes::locations::CheckDevicesResponse,
        routes::alerts::AlertsResponse,
        routes::offices::OfficeCreateRequest,
        routes::offices::OfficeUpdateRequest,
        routes::offices::OfficesResponse,
        routes::troubleshoot::TroubleshootResponse,
        hierarchy::HierarchyLevel,
        hierarchy::HierarchyNode,
        hierarchy::DeviceSummary,
        hierarchy::LocationGroup,
        hierarchy::HierarchySnapshot,
        hierarchy::types::DeviceRecord,
        hierarchy::types::GeoPoint,
        hierarchy::types::AlertState,
        hierarchy::types::DeviceMetrics,
        hierarchy::types::InterfaceMetrics,
        hierarchy::types::InterfaceStatus,
        hierarchy::types::OfficeEntity,
        hierarchy::types::DeviceType,
        hierarchy::types::DeviceTypeDistribution,
        hierarchy::types::HealthScore,
        hierarchy::types::HealthStatus,
        hierarchy::types::Severity,
    )),
    tags(
        (name = "devices", description = "Monitored device snapshots"),
        (name = "locations", description = "Location hierarchy and office drill-down"),
        (name = "alerts", description = "Alert event feed"),
        (name = "offices", description = "Office registry"),
        (name = "troubleshoot", description = "Troubleshooting assistant")
    )
)]
struct ApiDoc;

pub fn openapi_json() -> serde_json::Value {
    serde_json::to_value(ApiDoc::openapi()).unwrap_or_default()
}

pub(crate) async fn serve_openapi() -> Json<serde_json::Value> {
    Json(openapi_json())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths() {
        let doc = openapi_json();
        let paths = doc["paths"].as_object().expect("paths object");
        for expected in [
            "/healthz",
            "/api/devices",
            "/api/devices/{hostid}",
            "/api/locations",
            "/api/locations/{country}/{city}/{office}",
            "/api/locations/check-devices",
            "/api/alerts",
            "/api/offices",
            "/api/offices/{id}",
            "/api/troubleshoot",
        ] {
            assert!(paths.contains_key(expected), "missing path {expected}");
        }
    }
}
