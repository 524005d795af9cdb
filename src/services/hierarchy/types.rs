use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical severity bucket used by rollup counts. This is coarser than the
/// numeric health score: a device is placed in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Tolerant parse of the severity strings the ingest agent emits.
    /// Unrecognized values fall back to `Info` rather than failing a rollup.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" | "error" | "disaster" | "high" => Self::Critical,
            "warning" | "warn" | "average" => Self::Warning,
            _ => Self::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(from = "String")]
pub enum InterfaceStatus {
    Up,
    Down,
    Idle,
    #[default]
    Unknown,
}

impl From<String> for InterfaceStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "up" => Self::Up,
            "down" => Self::Down,
            "idle" => Self::Idle,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InterfaceMetrics {
    pub name: String,
    #[serde(default)]
    pub status: InterfaceStatus,
    #[serde(default)]
    pub errors_in: u64,
    #[serde(default)]
    pub errors_out: u64,
}

/// Raw metric snapshot attached to a device document. Every field is optional;
/// the scorer treats absence as "no penalty", never as zero utilization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceMetrics {
    #[serde(default)]
    pub cpu_utilization: Option<f64>,
    #[serde(default)]
    pub memory_utilization: Option<f64>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceMetrics>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub temperature_status: Option<String>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Latest alert state merged onto a device by the store. Severity stays a raw
/// string here; `Severity::parse` canonicalizes it at aggregation time.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AlertState {
    pub status: String,
    pub severity: String,
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
}

/// One monitored device as the engine sees it. Read-only input; duplicate
/// hostids are collapsed last-write-wins by the store before aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceRecord {
    pub hostid: String,
    pub device_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub alert: Option<AlertState>,
    #[serde(default)]
    pub metrics: DeviceMetrics,
}

/// Registered office document, created through the office registry endpoint.
/// Unknown document fields are tolerated so the form can evolve.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OfficeEntity {
    pub id: String,
    pub office: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(default)]
    pub device_ids: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default = "default_office_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_office_status() -> String {
    "active".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Router,
    Switch,
    Pc,
    Interface,
    Other,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
            Self::Pc => "pc",
            Self::Interface => "interface",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeviceTypeDistribution {
    pub routers: u32,
    pub switches: u32,
    pub pcs: u32,
    pub interfaces: u32,
    pub other: u32,
}

impl DeviceTypeDistribution {
    pub fn record(&mut self, device_type: DeviceType) {
        match device_type {
            DeviceType::Router => self.routers += 1,
            DeviceType::Switch => self.switches += 1,
            DeviceType::Pc => self.pcs += 1,
            DeviceType::Interface => self.interfaces += 1,
            DeviceType::Other => self.other += 1,
        }
    }

    pub fn merge(&mut self, other: &DeviceTypeDistribution) {
        self.routers += other.routers;
        self.switches += other.switches;
        self.pcs += other.pcs;
        self.interfaces += other.interfaces;
        self.other += other.other;
    }

    pub fn total(&self) -> u32 {
        self.routers + self.switches + self.pcs + self.interfaces + self.other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            75..=89 => Self::Good,
            50..=74 => Self::Warning,
            _ => Self::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Per-dimension health breakdown, each value clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthScore {
    pub overall: u8,
    pub cpu: u8,
    pub memory: u8,
    pub interfaces: u8,
    pub temperature: u8,
    pub uptime: u8,
}

impl HealthScore {
    pub fn status(&self) -> HealthStatus {
        HealthStatus::from_score(self.overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_parse_is_tolerant() {
        assert_eq!(Severity::parse("CRITICAL"), Severity::Critical);
        assert_eq!(Severity::parse("error"), Severity::Critical);
        assert_eq!(Severity::parse(" warn "), Severity::Warning);
        assert_eq!(Severity::parse("average"), Severity::Warning);
        assert_eq!(Severity::parse("healthy"), Severity::Info);
        assert_eq!(Severity::parse(""), Severity::Info);
        assert_eq!(Severity::parse("garbage"), Severity::Info);
    }

    #[test]
    fn health_status_thresholds() {
        assert_eq!(HealthStatus::from_score(100), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(90), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(89), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(75), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(74), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(50), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(49), HealthStatus::Critical);
        assert_eq!(HealthStatus::from_score(0), HealthStatus::Critical);
    }

    #[test]
    fn device_record_tolerates_sparse_documents() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{"hostid": "10105", "device_id": "SW-Floor2"}"#,
        )
        .unwrap();
        assert_eq!(record.location, "");
        assert!(record.geo.is_none());
        assert!(record.metrics.cpu_utilization.is_none());
        assert!(record.metrics.interfaces.is_empty());
    }

    #[test]
    fn interface_status_unknown_for_unrecognized_values() {
        let iface: InterfaceMetrics =
            serde_json::from_str(r#"{"name": "eth0", "status": "Flapping"}"#).unwrap();
        assert_eq!(iface.status, InterfaceStatus::Unknown);
    }

    #[test]
    fn distribution_merge_preserves_totals() {
        let mut a = DeviceTypeDistribution::default();
        a.record(DeviceType::Router);
        a.record(DeviceType::Switch);
        let mut b = DeviceTypeDistribution::default();
        b.record(DeviceType::Pc);
        b.record(DeviceType::Other);
        a.merge(&b);
        assert_eq!(a.total(), 4);
        assert_eq!(a.routers, 1);
        assert_eq!(a.pcs, 1);
    }
}
