//! Health scoring. Each dimension starts at 100 and loses a fixed penalty per
//! threshold crossed; missing metrics never cost anything. A device with every
//! interface down is forced to an overall of 0 regardless of other metrics.

use super::types::{DeviceMetrics, HealthScore, InterfaceStatus};

fn cpu_penalty(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v > 90.0 => 30.0,
        Some(v) if v > 75.0 => 20.0,
        Some(v) if v > 50.0 => 10.0,
        _ => 0.0,
    }
}

fn memory_penalty(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v > 90.0 => 25.0,
        Some(v) if v > 75.0 => 15.0,
        Some(v) if v > 50.0 => 5.0,
        _ => 0.0,
    }
}

fn temperature_penalty(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v > 80.0 => 20.0,
        Some(v) if v > 70.0 => 10.0,
        _ => 0.0,
    }
}

fn uptime_penalty(value: Option<u64>) -> f64 {
    // A sub-hour uptime usually means the device just rebooted.
    match value {
        Some(v) if v < 3600 => 20.0,
        _ => 0.0,
    }
}

fn sub_score(penalty: f64) -> u8 {
    (100.0 - penalty).clamp(0.0, 100.0).round() as u8
}

pub fn score_device(metrics: &DeviceMetrics) -> HealthScore {
    let cpu = cpu_penalty(metrics.cpu_utilization);
    let memory = memory_penalty(metrics.memory_utilization);
    let temperature = temperature_penalty(metrics.temperature);
    let uptime = uptime_penalty(metrics.uptime_seconds);

    let total_interfaces = metrics.interfaces.len();
    let down_interfaces = metrics
        .interfaces
        .iter()
        .filter(|iface| iface.status == InterfaceStatus::Down)
        .count();
    let interfaces = if total_interfaces > 0 {
        40.0 * down_interfaces as f64 / total_interfaces as f64
    } else {
        0.0
    };
    let all_down = total_interfaces > 0 && down_interfaces == total_interfaces;

    let overall = if all_down {
        0
    } else {
        sub_score(cpu + memory + interfaces + temperature + uptime)
    };

    HealthScore {
        overall,
        cpu: sub_score(cpu),
        memory: sub_score(memory),
        interfaces: if all_down { 0 } else { sub_score(interfaces) },
        temperature: sub_score(temperature),
        uptime: sub_score(uptime),
    }
}

/// Office-level rollup score derived from member counts rather than raw
/// metrics. An office with no devices scores 0, not 100.
pub fn office_health_score(total: u32, offline: u32, critical: u32, warning: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let total = total as f64;
    let score = 100.0
        - 50.0 * offline as f64 / total
        - 30.0 * critical as f64 / total
        - 15.0 * warning as f64 / total;
    score.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hierarchy::types::{HealthStatus, InterfaceMetrics};

    fn iface(name: &str, status: InterfaceStatus) -> InterfaceMetrics {
        InterfaceMetrics {
            name: name.to_string(),
            status,
            errors_in: 0,
            errors_out: 0,
        }
    }

    #[test]
    fn missing_metrics_score_perfect() {
        let score = score_device(&DeviceMetrics::default());
        assert_eq!(score.overall, 100);
        assert_eq!(score.cpu, 100);
        assert_eq!(score.memory, 100);
        assert_eq!(score.interfaces, 100);
        assert_eq!(score.status(), HealthStatus::Excellent);
    }

    #[test]
    fn cpu_95_with_healthy_memory_lands_in_warning() {
        let metrics = DeviceMetrics {
            cpu_utilization: Some(95.0),
            memory_utilization: Some(40.0),
            ..Default::default()
        };
        let score = score_device(&metrics);
        assert!(score.cpu <= 80);
        assert_eq!(score.memory, 100);
        assert_eq!(score.overall, 70);
        assert_eq!(score.status(), HealthStatus::Warning);
    }

    #[test]
    fn cpu_score_is_monotone_in_utilization() {
        let at_70 = score_device(&DeviceMetrics {
            cpu_utilization: Some(70.0),
            ..Default::default()
        });
        let at_95 = score_device(&DeviceMetrics {
            cpu_utilization: Some(95.0),
            ..Default::default()
        });
        assert!(at_95.overall < at_70.overall);
        assert!(at_95.cpu < at_70.cpu);
    }

    #[test]
    fn all_interfaces_down_forces_zero_overall() {
        let metrics = DeviceMetrics {
            cpu_utilization: Some(5.0),
            memory_utilization: Some(5.0),
            interfaces: vec![
                iface("eth0", InterfaceStatus::Down),
                iface("eth1", InterfaceStatus::Down),
                iface("eth2", InterfaceStatus::Down),
                iface("eth3", InterfaceStatus::Down),
            ],
            ..Default::default()
        };
        let score = score_device(&metrics);
        assert_eq!(score.interfaces, 0);
        assert_eq!(score.overall, 0);
        assert_eq!(score.status(), HealthStatus::Critical);
    }

    #[test]
    fn partial_interface_outage_is_proportional() {
        let metrics = DeviceMetrics {
            interfaces: vec![
                iface("eth0", InterfaceStatus::Down),
                iface("eth1", InterfaceStatus::Up),
                iface("eth2", InterfaceStatus::Up),
                iface("eth3", InterfaceStatus::Idle),
            ],
            ..Default::default()
        };
        let score = score_device(&metrics);
        assert_eq!(score.interfaces, 90);
        assert_eq!(score.overall, 90);
    }

    #[test]
    fn scores_stay_clamped_under_stacked_penalties() {
        let metrics = DeviceMetrics {
            cpu_utilization: Some(99.0),
            memory_utilization: Some(99.0),
            temperature: Some(95.0),
            uptime_seconds: Some(120),
            interfaces: vec![
                iface("eth0", InterfaceStatus::Down),
                iface("eth1", InterfaceStatus::Up),
            ],
            ..Default::default()
        };
        let score = score_device(&metrics);
        assert_eq!(score.overall, 0);
        assert!(score.cpu <= 100 && score.memory <= 100);
    }

    #[test]
    fn office_score_weights_offline_heaviest() {
        assert_eq!(office_health_score(0, 0, 0, 0), 0);
        assert_eq!(office_health_score(10, 0, 0, 0), 100);
        assert_eq!(office_health_score(10, 2, 0, 0), 90);
        assert_eq!(office_health_score(10, 0, 2, 0), 94);
        assert_eq!(office_health_score(10, 0, 0, 2), 97);
        assert_eq!(office_health_score(4, 4, 4, 4), 5);
    }
}
