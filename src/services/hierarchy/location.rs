//! Location resolution and device classification over versioned static
//! tables. Everything here is pure: the same inputs always produce the same
//! placement, so rollups stay reproducible across requests.

use super::types::{DeviceType, GeoPoint};

/// Bumped whenever the lookup tables below change, so placement drift can be
/// traced to a data update rather than a logic change.
pub const LOCATION_TABLE_VERSION: u32 = 3;

pub const UNKNOWN_COUNTRY: &str = "Unknown";
pub const UNKNOWN_CITY: &str = "Unknown";
pub const DEFAULT_OFFICE: &str = "Main Office";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedLocation {
    pub country: String,
    pub city: String,
    pub office: String,
}

impl ResolvedLocation {
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN_COUNTRY.to_string(),
            city: UNKNOWN_CITY.to_string(),
            office: DEFAULT_OFFICE.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.country == UNKNOWN_COUNTRY
    }

    pub fn full_path(&self) -> String {
        format!("{} > {} > {}", self.country, self.city, self.office)
    }
}

struct OfficeEntry {
    fragment: &'static str,
    office: &'static str,
    city: &'static str,
    country: &'static str,
    // Offset from the city anchor, so co-located offices do not stack on maps.
    offset: (f64, f64),
}

struct CityEntry {
    fragment: &'static str,
    city: &'static str,
    country: &'static str,
    coords: (f64, f64),
}

struct CountryEntry {
    country: &'static str,
    center: (f64, f64),
}

const OFFICE_TABLE: &[OfficeEntry] = &[
    OfficeEntry {
        fragment: "bkc",
        office: "BKC Office",
        city: "Mumbai",
        country: "India",
        offset: (0.010, 0.015),
    },
    OfficeEntry {
        fragment: "andheri",
        office: "Andheri Office",
        city: "Mumbai",
        country: "India",
        offset: (0.045, -0.030),
    },
    OfficeEntry {
        fragment: "powai",
        office: "Powai Office",
        city: "Mumbai",
        country: "India",
        offset: (0.042, 0.028),
    },
    OfficeEntry {
        fragment: "connaught",
        office: "Connaught Place Office",
        city: "Delhi",
        country: "India",
        offset: (0.012, -0.008),
    },
    OfficeEntry {
        fragment: "whitefield",
        office: "Whitefield Office",
        city: "Bengaluru",
        country: "India",
        offset: (0.008, 0.175),
    },
    OfficeEntry {
        fragment: "electronic city",
        office: "Electronic City Office",
        city: "Bengaluru",
        country: "India",
        offset: (-0.130, 0.065),
    },
    OfficeEntry {
        fragment: "hitec",
        office: "HITEC City Office",
        city: "Hyderabad",
        country: "India",
        offset: (0.060, -0.105),
    },
    OfficeEntry {
        fragment: "omr",
        office: "OMR Office",
        city: "Chennai",
        country: "India",
        offset: (-0.155, 0.020),
    },
];

const CITY_TABLE: &[CityEntry] = &[
    CityEntry {
        fragment: "mumbai",
        city: "Mumbai",
        country: "India",
        coords: (19.0760, 72.8777),
    },
    CityEntry {
        fragment: "new delhi",
        city: "Delhi",
        country: "India",
        coords: (28.6139, 77.2090),
    },
    CityEntry {
        fragment: "delhi",
        city: "Delhi",
        country: "India",
        coords: (28.6139, 77.2090),
    },
    CityEntry {
        fragment: "bengaluru",
        city: "Bengaluru",
        country: "India",
        coords: (12.9716, 77.5946),
    },
    CityEntry {
        fragment: "bangalore",
        city: "Bengaluru",
        country: "India",
        coords: (12.9716, 77.5946),
    },
    CityEntry {
        fragment: "hyderabad",
        city: "Hyderabad",
        country: "India",
        coords: (17.3850, 78.4867),
    },
    CityEntry {
        fragment: "chennai",
        city: "Chennai",
        country: "India",
        coords: (13.0827, 80.2707),
    },
    CityEntry {
        fragment: "pune",
        city: "Pune",
        country: "India",
        coords: (18.5204, 73.8567),
    },
    CityEntry {
        fragment: "kolkata",
        city: "Kolkata",
        country: "India",
        coords: (22.5726, 88.3639),
    },
];

const COUNTRY_TABLE: &[CountryEntry] = &[CountryEntry {
    country: "India",
    center: (20.5937, 78.9629),
}];

const ROUTER_KEYWORDS: &[&str] = &["router", "rtr"];
const SWITCH_KEYWORDS: &[&str] = &["switch", "sw"];
const PC_KEYWORDS: &[&str] = &["pc", "desktop", "laptop", "workstation", "computer"];
const INTERFACE_KEYWORDS: &[&str] = &["interface", "port", "eth"];

/// Map a raw location string (plus optional geo hints) onto the canonical
/// country/city/office triple.
///
/// Priority order: explicit geo city/country when both are present, then the
/// office fragment table (most specific), then the city fragment table, then
/// the sentinels. Matching is case-insensitive substring containment.
pub fn resolve_location(raw: &str, geo: Option<&GeoPoint>) -> ResolvedLocation {
    let lower = raw.trim().to_lowercase();

    if let Some(geo) = geo {
        if let (Some(city), Some(country)) = (geo.city.as_deref(), geo.country.as_deref()) {
            let city = city.trim();
            let country = country.trim();
            if !city.is_empty() && !country.is_empty() {
                let office = OFFICE_TABLE
                    .iter()
                    .find(|entry| lower.contains(entry.fragment))
                    .map(|entry| entry.office.to_string())
                    .unwrap_or_else(|| DEFAULT_OFFICE.to_string());
                return ResolvedLocation {
                    country: country.to_string(),
                    city: city.to_string(),
                    office,
                };
            }
        }
    }

    if lower.is_empty() || lower.contains("unknown location") {
        return ResolvedLocation::unknown();
    }

    if let Some(entry) = OFFICE_TABLE
        .iter()
        .find(|entry| lower.contains(entry.fragment))
    {
        return ResolvedLocation {
            country: entry.country.to_string(),
            city: entry.city.to_string(),
            office: entry.office.to_string(),
        };
    }

    if let Some(entry) = CITY_TABLE
        .iter()
        .find(|entry| lower.contains(entry.fragment))
    {
        return ResolvedLocation {
            country: entry.country.to_string(),
            city: entry.city.to_string(),
            office: DEFAULT_OFFICE.to_string(),
        };
    }

    ResolvedLocation::unknown()
}

/// Approximate map coordinates for a resolved placement, used only when a
/// device carries no geo of its own. Office entries anchor on their city.
pub fn approx_coordinates(resolved: &ResolvedLocation) -> Option<(f64, f64)> {
    if let Some(entry) = OFFICE_TABLE.iter().find(|entry| entry.office == resolved.office) {
        if let Some(city) = CITY_TABLE.iter().find(|city| city.city == entry.city) {
            return Some((city.coords.0 + entry.offset.0, city.coords.1 + entry.offset.1));
        }
    }
    if let Some(entry) = CITY_TABLE.iter().find(|entry| entry.city == resolved.city) {
        return Some(entry.coords);
    }
    COUNTRY_TABLE
        .iter()
        .find(|entry| entry.country == resolved.country)
        .map(|entry| entry.center)
}

/// Keyword classification of a device id. Sets are checked in fixed order and
/// the first hit wins, so an id matching several sets classifies the same way
/// every time.
pub fn classify_device(device_id: &str) -> DeviceType {
    let id = device_id.trim().to_lowercase();
    if ROUTER_KEYWORDS.iter().any(|kw| id.contains(kw)) {
        return DeviceType::Router;
    }
    if SWITCH_KEYWORDS.iter().any(|kw| id.contains(kw)) {
        return DeviceType::Switch;
    }
    if PC_KEYWORDS.iter().any(|kw| id.contains(kw)) {
        return DeviceType::Pc;
    }
    if INTERFACE_KEYWORDS.iter().any(|kw| id.contains(kw)) {
        return DeviceType::Interface;
    }
    DeviceType::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_fragment_beats_city_fragment() {
        let resolved = resolve_location("Mumbai-BKC-Floor3", None);
        assert_eq!(resolved.country, "India");
        assert_eq!(resolved.city, "Mumbai");
        assert_eq!(resolved.office, "BKC Office");
    }

    #[test]
    fn city_only_strings_land_in_main_office() {
        let resolved = resolve_location("Rack 12, Chennai DC", None);
        assert_eq!(resolved.city, "Chennai");
        assert_eq!(resolved.office, DEFAULT_OFFICE);
    }

    #[test]
    fn unknown_location_short_circuits() {
        assert!(resolve_location("", None).is_unknown());
        assert!(resolve_location("Unknown Location", None).is_unknown());
        assert!(resolve_location("rack in UNKNOWN LOCATION 4", None).is_unknown());
        assert!(resolve_location("somewhere else entirely", None).is_unknown());
    }

    #[test]
    fn geo_hints_take_priority() {
        let geo = GeoPoint {
            lat: 18.52,
            lon: 73.85,
            source: Some("snmp-sysLocation".to_string()),
            city: Some("Pune".to_string()),
            country: Some("India".to_string()),
        };
        let resolved = resolve_location("unhelpful free text", Some(&geo));
        assert_eq!(resolved.city, "Pune");
        assert_eq!(resolved.country, "India");
        assert_eq!(resolved.office, DEFAULT_OFFICE);
    }

    #[test]
    fn geo_hints_missing_city_fall_through_to_tables() {
        let geo = GeoPoint {
            lat: 19.0,
            lon: 72.8,
            source: None,
            city: None,
            country: Some("India".to_string()),
        };
        let resolved = resolve_location("Mumbai core", Some(&geo));
        assert_eq!(resolved.city, "Mumbai");
    }

    #[test]
    fn resolution_is_deterministic() {
        let a = resolve_location("Bangalore Whitefield lab", None);
        let b = resolve_location("Bangalore Whitefield lab", None);
        assert_eq!(a, b);
        assert_eq!(a.office, "Whitefield Office");
    }

    #[test]
    fn approx_coordinates_fall_back_city_then_country() {
        let office = resolve_location("bkc", None);
        let city = resolve_location("mumbai", None);
        let (office_lat, _) = approx_coordinates(&office).unwrap();
        let (city_lat, _) = approx_coordinates(&city).unwrap();
        assert!((office_lat - city_lat).abs() > f64::EPSILON);
        assert!(approx_coordinates(&ResolvedLocation::unknown()).is_none());
    }

    #[test]
    fn classifier_fixed_order() {
        assert_eq!(classify_device("rtr-core-1"), DeviceType::Router);
        assert_eq!(classify_device("edge-router-3"), DeviceType::Router);
        assert_eq!(classify_device("SW-Floor2"), DeviceType::Switch);
        assert_eq!(classify_device("Reception-PC-04"), DeviceType::Pc);
        assert_eq!(classify_device("GigabitEthernet0/1 port"), DeviceType::Interface);
        assert_eq!(classify_device("ups-basement"), DeviceType::Other);
        // "router" wins over "port" because router keywords are checked first
        assert_eq!(classify_device("router-port-mirror"), DeviceType::Router);
    }
}
