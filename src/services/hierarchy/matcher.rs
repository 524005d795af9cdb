//! Device-to-office matching. Offices are tried in registry insertion order
//! and the first positive match wins, so a device never lands in two offices.

use super::types::{DeviceRecord, OfficeEntity};

/// A positive match, tagged with how it was made. Id matches come from an
/// explicit `device_ids` entry on the office; location matches are inferred
/// from free-text containment and therefore weaker.
#[derive(Debug, Clone, Copy)]
pub enum OfficeMatch<'a> {
    Id(&'a OfficeEntity),
    Location(&'a OfficeEntity),
}

impl<'a> OfficeMatch<'a> {
    pub fn office(&self) -> &'a OfficeEntity {
        match self {
            Self::Id(office) | Self::Location(office) => office,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Id(_))
    }
}

/// Lowercase and strip everything that is not ASCII alphanumeric, so
/// "BKC Office", "bkc-office" and "BKC_OFFICE" all compare equal.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Find the office a device belongs to, if any.
///
/// Per office, an explicit `device_ids` hit short-circuits to an id match;
/// otherwise the normalized device location is compared (equality or
/// containment) against the office's own identifying strings. Iteration stops
/// at the first office that matches either way.
pub fn match_office<'a>(
    device: &DeviceRecord,
    offices: &'a [OfficeEntity],
) -> Option<OfficeMatch<'a>> {
    let location = normalize(&device.location);
    let id_candidates: Vec<String> = [
        normalize(&device.hostid),
        normalize(&device.device_id),
        normalize(&format!("{}-{}", device.device_id, device.hostid)),
    ]
    .into_iter()
    .filter(|candidate| !candidate.is_empty())
    .collect();

    for office in offices {
        if !office.device_ids.is_empty() {
            let listed = office
                .device_ids
                .iter()
                .map(|id| normalize(id))
                .filter(|id| !id.is_empty());
            for listed_id in listed {
                if id_candidates.iter().any(|candidate| *candidate == listed_id) {
                    return Some(OfficeMatch::Id(office));
                }
            }
        }

        if location.is_empty() {
            continue;
        }
        let location_candidates = [
            normalize(&office.office),
            normalize(&office.id),
            normalize(&format!("{}-{}", office.city, office.office)),
            normalize(&format!(
                "{}-{}-{}",
                office.country, office.city, office.office
            )),
        ];
        for candidate in location_candidates {
            if candidate.is_empty() {
                continue;
            }
            if location == candidate || location.contains(&candidate) {
                return Some(OfficeMatch::Location(office));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hierarchy::types::DeviceMetrics;

    fn office(id: &str, name: &str, city: &str, device_ids: &[&str]) -> OfficeEntity {
        OfficeEntity {
            id: id.to_string(),
            office: name.to_string(),
            city: city.to_string(),
            country: "India".to_string(),
            geo: None,
            device_ids: device_ids.iter().map(|s| s.to_string()).collect(),
            description: None,
            contact_info: None,
            status: "active".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    fn device(hostid: &str, device_id: &str, location: &str) -> DeviceRecord {
        DeviceRecord {
            hostid: hostid.to_string(),
            device_id: device_id.to_string(),
            location: location.to_string(),
            geo: None,
            last_seen: None,
            alert: None,
            metrics: DeviceMetrics::default(),
        }
    }

    #[test]
    fn normalization_strips_separators() {
        assert_eq!(normalize("BKC Office"), "bkcoffice");
        assert_eq!(normalize("bkc-office"), "bkcoffice");
        assert_eq!(normalize("BKC_OFFICE!"), "bkcoffice");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn location_containment_matches() {
        let offices = vec![office("of-1", "BKC Office", "Mumbai", &[])];
        let dev = device("10101", "SW-Core", "Mumbai BKC Office, Floor 3");
        let matched = match_office(&dev, &offices).unwrap();
        assert_eq!(matched.office().id, "of-1");
        assert!(!matched.is_explicit());
    }

    #[test]
    fn explicit_device_id_wins_over_location_text() {
        let offices = vec![
            office("of-1", "Andheri Office", "Mumbai", &[]),
            office("of-2", "BKC Office", "Mumbai", &["R1-9001"]),
        ];
        // Location text says Andheri, but the registry pins the device to BKC.
        let dev = device("9001", "R1", "Andheri Office rack 2");
        // Insertion order still applies: of-1 matches by location first.
        let matched = match_office(&dev, &offices).unwrap();
        assert_eq!(matched.office().id, "of-1");

        // With no location text, only the explicit list can place it.
        let dev = device("9001", "R1", "");
        let matched = match_office(&dev, &offices).unwrap();
        assert_eq!(matched.office().id, "of-2");
        assert!(matched.is_explicit());
    }

    #[test]
    fn concatenated_id_form_matches_listed_id() {
        let offices = vec![office("of-9", "OMR Office", "Chennai", &["R1-9001"])];
        let dev = device("9001", "R1", "unrelated text");
        let matched = match_office(&dev, &offices).unwrap();
        assert!(matched.is_explicit());
        assert_eq!(matched.office().id, "of-9");
    }

    #[test]
    fn at_most_one_office_and_first_wins() {
        let offices = vec![
            office("of-a", "BKC Office", "Mumbai", &[]),
            office("of-b", "BKC Office", "Mumbai", &[]),
        ];
        let dev = device("1", "sw1", "BKC Office");
        let matched = match_office(&dev, &offices).unwrap();
        assert_eq!(matched.office().id, "of-a");
    }

    #[test]
    fn empty_signals_never_match() {
        let offices = vec![office("of-1", "BKC Office", "Mumbai", &[])];
        let dev = device("1", "sw1", "");
        assert!(match_office(&dev, &offices).is_none());

        let dev = device("1", "sw1", "no office mentioned here");
        assert!(match_office(&dev, &offices).is_none());
    }

    #[test]
    fn matcher_is_deterministic() {
        let offices = vec![
            office("of-1", "HITEC City Office", "Hyderabad", &["sw-77"]),
            office("of-2", "OMR Office", "Chennai", &[]),
        ];
        let dev = device("77", "SW-77", "Chennai OMR Office");
        let first = match_office(&dev, &offices).map(|m| m.office().id.clone());
        for _ in 0..10 {
            let again = match_office(&dev, &offices).map(|m| m.office().id.clone());
            assert_eq!(first, again);
        }
    }
}
