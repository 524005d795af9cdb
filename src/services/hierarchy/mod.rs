//! The location hierarchy engine: groups monitored devices into a
//! country > city > office forest with additive health rollups. Pure and
//! synchronous; the routes fetch inputs and stamp timestamps.

pub mod location;
pub mod matcher;
pub mod scorer;
pub mod types;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use self::location::{ResolvedLocation, DEFAULT_OFFICE, UNKNOWN_CITY, UNKNOWN_COUNTRY};
use self::types::{
    DeviceRecord, DeviceType, DeviceTypeDistribution, HealthScore, HealthStatus, OfficeEntity,
    Severity,
};

pub const UNCLASSIFIED_NAME: &str = "Unclassified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    Country,
    City,
    Office,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceSummary {
    pub hostid: String,
    pub device_id: String,
    pub device_type: DeviceType,
    pub status: String,
    pub severity: Severity,
    pub health: HealthScore,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HierarchyNode {
    pub level: HierarchyLevel,
    pub name: String,
    pub path: String,
    pub device_count: u32,
    pub healthy_count: u32,
    pub warning_count: u32,
    pub critical_count: u32,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type_distribution: Option<DeviceTypeDistribution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
}

/// Flat per-raw-location summary, keyed by the location string exactly as the
/// monitoring feed reported it. Feeds the map and the location list view.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LocationGroup {
    pub location: String,
    pub country: String,
    pub city: String,
    pub office: String,
    pub full_path: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    pub device_count: u32,
    pub healthy_count: u32,
    pub warning_count: u32,
    pub critical_count: u32,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    pub device_type_distribution: DeviceTypeDistribution,
    pub devices: Vec<DeviceSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HierarchySnapshot {
    pub total_devices: u32,
    pub locations: Vec<LocationGroup>,
    pub hierarchy: Vec<HierarchyNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unclassified: Option<HierarchyNode>,
}

impl HierarchySnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_devices == 0
    }
}

/// The one severity a device contributes to rollup counts. An explicit alert
/// carries operator-visible state the score cannot see, so it wins; otherwise
/// the bucket is derived from the computed health status.
pub fn canonical_severity(device: &DeviceRecord, health: &HealthScore) -> Severity {
    if let Some(alert) = &device.alert {
        return Severity::parse(&alert.severity);
    }
    match health.status() {
        HealthStatus::Excellent | HealthStatus::Good => Severity::Info,
        HealthStatus::Warning => Severity::Warning,
        HealthStatus::Critical => Severity::Critical,
    }
}

/// Where a device lands in the hierarchy: a registered office match overrides
/// whatever the free-text resolver would have said.
pub fn place_device(device: &DeviceRecord, offices: &[OfficeEntity]) -> ResolvedLocation {
    match matcher::match_office(device, offices) {
        Some(found) => {
            let office = found.office();
            ResolvedLocation {
                country: office.country.clone(),
                city: office.city.clone(),
                office: office.office.clone(),
            }
        }
        None => location::resolve_location(&device.location, device.geo.as_ref()),
    }
}

fn slug(value: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    out
}

fn country_path(country: &str) -> String {
    if country == UNKNOWN_COUNTRY {
        "/locations".to_string()
    } else {
        format!("/{}", slug(country))
    }
}

fn city_path(country: &str, city: &str) -> String {
    if city == UNKNOWN_CITY {
        country_path(country)
    } else {
        format!("{}/{}", country_path(country), slug(city))
    }
}

fn office_path(country: &str, city: &str, office: &str) -> String {
    if office == DEFAULT_OFFICE {
        city_path(country, city)
    } else {
        format!("{}/{}", city_path(country, city), slug(office))
    }
}

#[derive(Default)]
struct Bucket {
    devices: Vec<DeviceSummary>,
    distribution: DeviceTypeDistribution,
    healthy: u32,
    warning: u32,
    critical: u32,
    last_seen: Option<DateTime<Utc>>,
}

impl Bucket {
    fn push(&mut self, summary: DeviceSummary) {
        self.distribution.record(summary.device_type);
        match summary.severity {
            Severity::Info => self.healthy += 1,
            Severity::Warning => self.warning += 1,
            Severity::Critical => self.critical += 1,
        }
        self.last_seen = self.last_seen.max(summary.last_seen);
        self.devices.push(summary);
    }
}

/// Build the full snapshot: flat per-location groups plus the rolled-up
/// country > city > office forest. Parent counts are sums of children and
/// parent `last_seen` is the max; devices the resolver cannot place end up in
/// a separate `unclassified` branch instead of being dropped.
pub fn build_hierarchy(devices: &[DeviceRecord], offices: &[OfficeEntity]) -> HierarchySnapshot {
    let mut flat: BTreeMap<String, (ResolvedLocation, Bucket)> = BTreeMap::new();
    let mut tree: BTreeMap<String, BTreeMap<String, BTreeMap<String, Bucket>>> = BTreeMap::new();

    for device in devices {
        let health = scorer::score_device(&device.metrics);
        let severity = canonical_severity(device, &health);
        let summary = DeviceSummary {
            hostid: device.hostid.clone(),
            device_id: device.device_id.clone(),
            device_type: location::classify_device(&device.device_id),
            status: device
                .alert
                .as_ref()
                .map(|alert| alert.status.clone())
                .unwrap_or_else(|| "Operational".to_string()),
            severity,
            health,
            last_seen: device.last_seen,
        };

        let raw = device.location.trim();
        let flat_key = if raw.is_empty() {
            "Unknown Location".to_string()
        } else {
            raw.to_string()
        };
        let (_, flat_bucket) = flat.entry(flat_key.clone()).or_insert_with(|| {
            (
                location::resolve_location(&flat_key, device.geo.as_ref()),
                Bucket::default(),
            )
        });
        flat_bucket.push(summary.clone());

        let placed = place_device(device, offices);
        tree.entry(placed.country)
            .or_default()
            .entry(placed.city)
            .or_default()
            .entry(placed.office)
            .or_default()
            .push(summary);
    }

    let locations = flat
        .into_iter()
        .map(|(raw, (resolved, bucket))| {
            let coords = location::approx_coordinates(&resolved);
            LocationGroup {
                location: raw,
                full_path: resolved.full_path(),
                country: resolved.country,
                city: resolved.city,
                office: resolved.office,
                lat: coords.map(|(lat, _)| lat),
                lon: coords.map(|(_, lon)| lon),
                device_count: bucket.devices.len() as u32,
                healthy_count: bucket.healthy,
                warning_count: bucket.warning,
                critical_count: bucket.critical,
                last_seen: bucket.last_seen,
                device_type_distribution: bucket.distribution,
                devices: bucket.devices,
            }
        })
        .collect();

    let mut total_devices = 0;
    let mut hierarchy = Vec::new();
    let mut unclassified = None;
    for (country, cities) in tree {
        let node = country_node(&country, cities);
        total_devices += node.device_count;
        if country == UNKNOWN_COUNTRY {
            unclassified = Some(HierarchyNode {
                name: UNCLASSIFIED_NAME.to_string(),
                ..node
            });
        } else {
            hierarchy.push(node);
        }
    }

    HierarchySnapshot {
        total_devices,
        locations,
        hierarchy,
        unclassified,
    }
}

fn country_node(country: &str, cities: BTreeMap<String, BTreeMap<String, Bucket>>) -> HierarchyNode {
    let children: Vec<HierarchyNode> = cities
        .into_iter()
        .map(|(city, offices)| city_node(country, &city, offices))
        .collect();
    let mut node = sum_children(HierarchyLevel::Country, country, country_path(country), children);
    node.device_type_distribution = None;
    node
}

fn city_node(country: &str, city: &str, offices: BTreeMap<String, Bucket>) -> HierarchyNode {
    let children: Vec<HierarchyNode> = offices
        .into_iter()
        .map(|(office, bucket)| office_node(country, city, &office, bucket))
        .collect();
    let mut node = sum_children(HierarchyLevel::City, city, city_path(country, city), children);
    node.device_type_distribution = None;
    node
}

fn office_node(country: &str, city: &str, office: &str, bucket: Bucket) -> HierarchyNode {
    HierarchyNode {
        level: HierarchyLevel::Office,
        name: office.to_string(),
        path: office_path(country, city, office),
        device_count: bucket.devices.len() as u32,
        healthy_count: bucket.healthy,
        warning_count: bucket.warning,
        critical_count: bucket.critical,
        last_seen: bucket.last_seen,
        device_type_distribution: Some(bucket.distribution),
        devices: bucket.devices,
        children: Vec::new(),
    }
}

fn sum_children(
    level: HierarchyLevel,
    name: &str,
    path: String,
    children: Vec<HierarchyNode>,
) -> HierarchyNode {
    let mut node = HierarchyNode {
        level,
        name: name.to_string(),
        path,
        device_count: 0,
        healthy_count: 0,
        warning_count: 0,
        critical_count: 0,
        last_seen: None,
        device_type_distribution: None,
        devices: Vec::new(),
        children,
    };
    for child in &node.children {
        node.device_count += child.device_count;
        node.healthy_count += child.healthy_count;
        node.warning_count += child.warning_count;
        node.critical_count += child.critical_count;
        node.last_seen = node.last_seen.max(child.last_seen);
    }
    node
}
