use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::error::{internal_error, map_db_error};
use crate::services::hierarchy::types::{GeoPoint, OfficeEntity};
use crate::services::store;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct OfficeCreateRequest {
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
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct OfficeUpdateRequest {
    pub office: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub geo: Option<GeoPoint>,
    pub device_ids: Option<Vec<String>>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OfficesResponse {
    pub count: usize,
    pub offices: Vec<OfficeEntity>,
}

fn required_field(value: &str, name: &str) -> Result<String, (StatusCode, String)> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err((StatusCode::BAD_REQUEST, format!("{name} is required")));
    }
    Ok(trimmed.to_string())
}

#[utoipa::path(
    post,
    path = "/api/offices",
    tag = "offices",
    request_body = OfficeCreateRequest,
    responses(
        (status = 200, description = "Office registered", body = OfficeEntity),
        (status = 400, description = "Missing office, city or country")
    )
)]
pub async fn create_office(
    State(state): State<AppState>,
    Json(request): Json<OfficeCreateRequest>,
) -> Result<Json<OfficeEntity>, (StatusCode, String)> {
    let now = Utc::now();
    let office = OfficeEntity {
        id: Uuid::new_v4().to_string(),
        office: required_field(&request.office, "office")?,
        city: required_field(&request.city, "city")?,
        country: required_field(&request.country, "country")?,
        geo: request.geo,
        device_ids: request
            .device_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
        description: request.description,
        contact_info: request.contact_info,
        status: "active".to_string(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let doc = serde_json::to_value(&office).map_err(internal_error)?;
    sqlx::query(
        r#"
        INSERT INTO offices (id, doc, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        "#,
    )
    .bind(&office.id)
    .bind(SqlJson(doc))
    .bind(now)
    .execute(&state.db)
    .await
    .map_err(map_db_error)?;

    tracing::info!(office_id = %office.id, office = %office.office, city = %office.city, "office registered");
    Ok(Json(office))
}

#[utoipa::path(
    get,
    path = "/api/offices",
    tag = "offices",
    responses((status = 200, description = "Registered offices", body = OfficesResponse))
)]
pub async fn list_offices(
    State(state): State<AppState>,
) -> Result<Json<OfficesResponse>, (StatusCode, String)> {
    let offices = store::fetch_offices(&state.db).await.map_err(map_db_error)?;
    Ok(Json(OfficesResponse {
        count: offices.len(),
        offices,
    }))
}

async fn load_office(
    state: &AppState,
    id: &str,
) -> Result<OfficeEntity, (StatusCode, String)> {
    let row: Option<(
        SqlJson<serde_json::Value>,
        DateTime<Utc>,
        DateTime<Utc>,
    )> = sqlx::query_as(
        r#"
        SELECT doc, created_at, updated_at
        FROM offices
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(map_db_error)?;
    let Some((doc, created_at, updated_at)) = row else {
        return Err((StatusCode::NOT_FOUND, "Office not found".to_string()));
    };
    let mut office: OfficeEntity = serde_json::from_value(doc.0)
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    office.id = id.to_string();
    office.created_at.get_or_insert(created_at);
    office.updated_at.get_or_insert(updated_at);
    Ok(office)
}

#[utoipa::path(
    get,
    path = "/api/offices/{id}",
    tag = "offices",
    params(("id" = String, Path, description = "Office id")),
    responses(
        (status = 200, description = "Office", body = OfficeEntity),
        (status = 404, description = "Unknown office")
    )
)]
pub async fn get_office(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OfficeEntity>, (StatusCode, String)> {
    let office = load_office(&state, id.trim()).await?;
    Ok(Json(office))
}

#[utoipa::path(
    put,
    path = "/api/offices/{id}",
    tag = "offices",
    params(("id" = String, Path, description = "Office id")),
    request_body = OfficeUpdateRequest,
    responses(
        (status = 200, description = "Office updated", body = OfficeEntity),
        (status = 404, description = "Unknown office")
    )
)]
pub async fn update_office(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<OfficeUpdateRequest>,
) -> Result<Json<OfficeEntity>, (StatusCode, String)> {
    let mut office = load_office(&state, id.trim()).await?;

    if let Some(value) = request.office {
        office.office = required_field(&value, "office")?;
    }
    if let Some(value) = request.city {
        office.city = required_field(&value, "city")?;
    }
    if let Some(value) = request.country {
        office.country = required_field(&value, "country")?;
    }
    if let Some(geo) = request.geo {
        office.geo = Some(geo);
    }
    if let Some(device_ids) = request.device_ids {
        office.device_ids = device_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
    }
    if let Some(description) = request.description {
        office.description = Some(description);
    }
    if let Some(contact_info) = request.contact_info {
        office.contact_info = Some(contact_info);
    }
    if let Some(status) = request.status {
        office.status = required_field(&status, "status")?;
    }

    let now = Utc::now();
    office.updated_at = Some(now);
    let doc = serde_json::to_value(&office).map_err(internal_error)?;
    sqlx::query(
        r#"
        UPDATE offices
        SET doc = $2, updated_at = $3
        WHERE id = $1
        "#,
    )
    .bind(&office.id)
    .bind(SqlJson(doc))
    .bind(now)
    .execute(&state.db)
    .await
    .map_err(map_db_error)?;

    Ok(Json(office))
}

#[utoipa::path(
    delete,
    path = "/api/offices/{id}",
    tag = "offices",
    params(("id" = String, Path, description = "Office id")),
    responses(
        (status = 200, description = "Office deleted"),
        (status = 404, description = "Unknown office")
    )
)]
pub async fn delete_office(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let result = sqlx::query(
        r#"
        DELETE FROM offices
        WHERE id = $1
        "#,
    )
    .bind(id.trim())
    .execute(&state.db)
    .await
    .map_err(map_db_error)?;
    if result.rows_affected() == 0 {
        return Err((StatusCode::NOT_FOUND, "Office not found".to_string()));
    }
    Ok(Json(json!({ "status": "ok" })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offices", get(list_offices).post(create_office))
        .route(
            "/offices/{id}",
            get(get_office).put(update_office).delete(delete_office),
        )
}
