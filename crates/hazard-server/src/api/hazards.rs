//! Hazard report endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use hazard_core::{
    Coordinate, HazardQuery, HazardReport, HazardStatus, HazardType, Place, Severity,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    internal_error, json_body, not_found, validation_error, ApiError, PageQuery, Pagination,
};
use crate::hazard_query::fetch_nearby_hazards;
use crate::persistence::hazards::{self, HazardFilter};
use crate::state::AppState;

const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CreateHazardRequest {
    pub hazard_type: HazardType,
    pub description: String,
    pub location: Place,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
}

impl CreateHazardRequest {
    fn validate(&self) -> Result<(), String> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err("description is required".to_string());
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            ));
        }
        if self.location.address.trim().is_empty() {
            return Err("location address is required".to_string());
        }
        self.location
            .coordinates
            .validate("location")
            .map_err(|err| err.to_string())?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListHazardsQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    pub hazard_type: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl ListHazardsQuery {
    fn filter(&self) -> Result<HazardFilter, ApiError> {
        let status = parse_param("status", self.status.as_deref(), HazardStatus::parse)?;
        let severity = parse_param("severity", self.severity.as_deref(), Severity::parse)?;
        let hazard_type =
            parse_param("hazard_type", self.hazard_type.as_deref(), HazardType::parse)?;
        Ok(HazardFilter {
            status,
            severity,
            hazard_type,
            include_inactive: false,
        })
    }
}

fn parse_param<T>(
    name: &str,
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| validation_error(format!("unknown {name} '{raw}'"))),
    }
}

#[derive(Debug, Serialize)]
pub struct HazardListResponse {
    pub hazards: Vec<HazardReport>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lon: f64,
    pub lat: f64,
    /// Search radius in meters
    pub max_distance: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub hazards: Vec<HazardReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: HazardStatus,
}

pub async fn create_hazard(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateHazardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HazardReport>), ApiError> {
    let request = json_body(payload)?;
    request.validate().map_err(validation_error)?;

    let mut hazard = HazardReport::new(
        Uuid::new_v4().to_string(),
        request.location.coordinates,
        request.severity.unwrap_or_default(),
    );
    hazard.hazard_type = request.hazard_type;
    hazard.description = request.description.trim().to_string();
    hazard.address = request.location.address;
    hazard.photo = request.photo;
    hazard.reported_by = request.reported_by;

    let hazard = state
        .save_hazard(hazard)
        .await
        .map_err(|err| internal_error("Failed to save hazard", err))?;

    tracing::info!(
        hazard_id = %hazard.id,
        severity = hazard.severity.as_str(),
        "Hazard reported at '{}'",
        hazard.address
    );
    Ok((StatusCode::CREATED, Json(hazard)))
}

pub async fn list_hazards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListHazardsQuery>,
) -> Result<Json<HazardListResponse>, ApiError> {
    let filter = query.filter()?;
    let paging = PageQuery {
        limit: query.limit,
        page: query.page,
    };
    let (limit, page, offset) = paging.resolve(50);

    let (hazards, total) = hazards::list_hazards(state.db().pool(), &filter, limit, offset)
        .await
        .map_err(|err| internal_error("Failed to list hazards", err))?;

    Ok(Json(HazardListResponse {
        hazards,
        pagination: Pagination::new(total, page, limit),
    }))
}

/// Eligible hazards around a point, nearest first.
pub async fn nearby_hazards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyResponse>, ApiError> {
    let center = Coordinate::new(query.lon, query.lat)
        .validate("query")
        .map_err(validation_error)?;

    let rules = state.rules();
    let radius_m = query.max_distance.unwrap_or(rules.query_radius_m);
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(validation_error("max_distance must be a positive number"));
    }
    let limit = query.limit.unwrap_or(rules.query_limit).clamp(1, 100);

    let fetch = fetch_nearby_hazards(&state, &HazardQuery::new(center, radius_m, limit)).await;
    let (hazards, degraded) = fetch.into_parts();
    Ok(Json(NearbyResponse { hazards, degraded }))
}

pub async fn get_hazard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<HazardReport>, ApiError> {
    let hazard = hazards::load_hazard(state.db().pool(), &id)
        .await
        .map_err(|err| internal_error("Failed to load hazard", err))?
        .ok_or_else(|| not_found("Hazard"))?;
    Ok(Json(hazard))
}

pub async fn update_hazard_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<HazardReport>, ApiError> {
    let request = json_body(payload)?;
    let hazard = state
        .update_hazard_status(&id, request.status, Utc::now())
        .await
        .map_err(|err| internal_error("Failed to update hazard", err))?
        .ok_or_else(|| not_found("Hazard"))?;

    tracing::info!("Hazard {} status -> {}", hazard.id, hazard.status.as_str());
    Ok(Json(hazard))
}

pub async fn delete_hazard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let found = state
        .deactivate_hazard(&id)
        .await
        .map_err(|err| internal_error("Failed to delete hazard", err))?;
    if !found {
        return Err(not_found("Hazard"));
    }

    tracing::info!("Deactivated hazard {}", id);
    Ok(StatusCode::NO_CONTENT)
}
