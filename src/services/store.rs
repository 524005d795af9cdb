//! Document-store access. Device snapshots and office registrations are kept
//! as jsonb documents; this module turns rows into engine inputs and shields
//! the engine from malformed documents.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use std::collections::BTreeMap;

use crate::services::hierarchy::types::{AlertState, DeviceRecord, OfficeEntity};

pub async fn ensure_schema(db: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS device_snapshots (
            hostid TEXT PRIMARY KEY,
            doc JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(db)
    .await
    .context("failed to ensure device_snapshots table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS offices (
            id TEXT PRIMARY KEY,
            doc JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(db)
    .await
    .context("failed to ensure offices table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alert_events (
            id BIGSERIAL PRIMARY KEY,
            hostid TEXT NOT NULL,
            device_id TEXT,
            status TEXT NOT NULL DEFAULT 'Problem',
            severity TEXT NOT NULL DEFAULT 'info',
            metric TEXT,
            value TEXT,
            message TEXT,
            detected_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(db)
    .await
    .context("failed to ensure alert_events table")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS alert_events_host_time_idx
        ON alert_events (hostid, detected_at DESC)
        "#,
    )
    .execute(db)
    .await
    .context("failed to ensure alert_events index")?;

    Ok(())
}

/// Entries the monitoring stack creates for itself; they would otherwise show
/// up as devices in every rollup.
fn is_monitoring_self(device_id: &str) -> bool {
    let id = device_id.to_lowercase();
    id.contains("zabbix") || id.contains("server")
}

/// All device snapshots, oldest write first, collapsed last-write-wins per
/// hostid, with the latest alert per host merged on. Malformed documents are
/// logged and skipped rather than failing the whole fetch.
pub async fn fetch_devices(db: &PgPool) -> Result<Vec<DeviceRecord>, sqlx::Error> {
    let rows: Vec<(String, SqlJson<serde_json::Value>)> = sqlx::query_as(
        r#"
        SELECT hostid, doc
        FROM device_snapshots
        ORDER BY updated_at ASC, hostid ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    let mut by_host: BTreeMap<String, DeviceRecord> = BTreeMap::new();
    for (hostid, doc) in rows {
        match serde_json::from_value::<DeviceRecord>(doc.0) {
            Ok(mut record) => {
                if record.hostid.trim().is_empty() {
                    record.hostid = hostid;
                }
                if is_monitoring_self(&record.device_id) {
                    continue;
                }
                by_host.insert(record.hostid.clone(), record);
            }
            Err(err) => {
                tracing::warn!(hostid = %hostid, error = %err, "skipping malformed device document");
            }
        }
    }

    let alerts: Vec<(String, String, String, Option<DateTime<Utc>>)> = sqlx::query_as(
        r#"
        SELECT DISTINCT ON (hostid) hostid, status, severity, detected_at
        FROM alert_events
        ORDER BY hostid, detected_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    for (hostid, status, severity, detected_at) in alerts {
        if let Some(record) = by_host.get_mut(&hostid) {
            record.alert = Some(AlertState {
                status,
                severity,
                detected_at,
            });
        }
    }

    Ok(by_host.into_values().collect())
}

pub async fn fetch_device(db: &PgPool, hostid: &str) -> Result<Option<DeviceRecord>, sqlx::Error> {
    let row: Option<(SqlJson<serde_json::Value>,)> = sqlx::query_as(
        r#"
        SELECT doc
        FROM device_snapshots
        WHERE hostid = $1
        "#,
    )
    .bind(hostid)
    .fetch_optional(db)
    .await?;
    let Some((doc,)) = row else {
        return Ok(None);
    };
    let mut record = match serde_json::from_value::<DeviceRecord>(doc.0) {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(hostid = %hostid, error = %err, "malformed device document");
            return Ok(None);
        }
    };
    if record.hostid.trim().is_empty() {
        record.hostid = hostid.to_string();
    }

    let alert: Option<(String, String, Option<DateTime<Utc>>)> = sqlx::query_as(
        r#"
        SELECT status, severity, detected_at
        FROM alert_events
        WHERE hostid = $1
        ORDER BY detected_at DESC
        LIMIT 1
        "#,
    )
    .bind(hostid)
    .fetch_optional(db)
    .await?;
    if let Some((status, severity, detected_at)) = alert {
        record.alert = Some(AlertState {
            status,
            severity,
            detected_at,
        });
    }
    Ok(Some(record))
}

/// Registered offices in insertion order. Insertion order is load-bearing:
/// the matcher awards a device to the first office that matches.
pub async fn fetch_offices(db: &PgPool) -> Result<Vec<OfficeEntity>, sqlx::Error> {
    let rows: Vec<(
        String,
        SqlJson<serde_json::Value>,
        DateTime<Utc>,
        DateTime<Utc>,
    )> = sqlx::query_as(
        r#"
        SELECT id, doc, created_at, updated_at
        FROM offices
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    let mut offices = Vec::with_capacity(rows.len());
    for (id, doc, created_at, updated_at) in rows {
        match serde_json::from_value::<OfficeEntity>(doc.0) {
            Ok(mut office) => {
                office.id = id;
                office.created_at.get_or_insert(created_at);
                office.updated_at.get_or_insert(updated_at);
                offices.push(office);
            }
            Err(err) => {
                tracing::warn!(office_id = %id, error = %err, "skipping malformed office document");
            }
        }
    }
    Ok(offices)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct AlertEvent {
    pub id: i64,
    pub hostid: String,
    pub device_id: Option<String>,
    pub status: String,
    pub severity: String,
    pub metric: Option<String>,
    pub value: Option<String>,
    pub message: Option<String>,
    pub detected_at: DateTime<Utc>,
}

pub async fn fetch_alerts(
    db: &PgPool,
    severity: Option<&str>,
    hostid: Option<&str>,
    limit: i64,
) -> Result<Vec<AlertEvent>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, hostid, device_id, status, severity, metric, value, message, detected_at
        FROM alert_events
        WHERE ($1::text IS NULL OR lower(severity) = lower($1))
          AND ($2::text IS NULL OR hostid = $2)
        ORDER BY detected_at DESC
        LIMIT $3
        "#,
    )
    .bind(severity)
    .bind(hostid)
    .bind(limit)
    .fetch_all(db)
    .await
}
