//! Route safety evaluation and route history endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use hazard_core::{
    evaluate_trip, hazard_query_for, HazardReport, Place, RouteKind, RouteRecord, RouteStats,
    TripRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{
    internal_error, json_body, not_found, validation_error, ApiError, PageQuery, Pagination,
};
use crate::hazard_query::fetch_nearby_hazards;
use crate::persistence::route_records;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CalculateRouteRequest {
    pub origin: Place,
    pub destination: Place,
    /// Owner/user the record is filed under
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalculateRouteResponse {
    pub route: RouteRecord,
    pub nearby_hazards: Vec<HazardReport>,
    /// Alternative kinds by safety score, best first
    pub ranking: Vec<RouteKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub owner_id: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub routes: Vec<RouteRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct SelectRouteRequest {
    pub route_type: RouteKind,
}

/// Evaluate the three alternatives for a trip and file the result.
pub async fn calculate_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculateRouteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CalculateRouteResponse>), ApiError> {
    let request = json_body(payload)?;
    let trip = TripRequest {
        origin: request.origin,
        destination: request.destination,
    };
    trip.validate().map_err(validation_error)?;

    let query = hazard_query_for(&trip, state.rules());
    let fetch = fetch_nearby_hazards(&state, &query).await;
    let result = evaluate_trip(&trip, fetch, state.rules()).map_err(validation_error)?;

    let record = RouteRecord::from_evaluation(
        Uuid::new_v4().to_string(),
        request.owner_id,
        &trip,
        &result,
        Utc::now(),
    );
    route_records::insert_route_record(state.db().pool(), &record)
        .await
        .map_err(|err| internal_error("Failed to persist route", err))?;

    tracing::info!(
        route_id = %record.id,
        nearby = result.nearby_hazards.len(),
        degraded = result.is_degraded(),
        "Calculated routes from '{}' to '{}'",
        trip.origin.address,
        trip.destination.address
    );

    let ranking = result.ranking();
    Ok((
        StatusCode::OK,
        Json(CalculateRouteResponse {
            route: record,
            nearby_hazards: result.nearby_hazards,
            ranking,
            degraded: result.degraded,
        }),
    ))
}

pub async fn route_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let paging = PageQuery {
        limit: query.limit,
        page: query.page,
    };
    let (limit, page, offset) = paging.resolve(20);
    let (routes, total) =
        route_records::load_history(state.db().pool(), query.owner_id.as_deref(), limit, offset)
            .await
            .map_err(|err| internal_error("Failed to load route history", err))?;

    Ok(Json(HistoryResponse {
        routes,
        pagination: Pagination::new(total, page, limit),
    }))
}

pub async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<RouteRecord>, ApiError> {
    let record = load_owned_record(&state, &id, owner.owner_id.as_deref()).await?;
    Ok(Json(record))
}

pub async fn delete_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Value>, ApiError> {
    load_owned_record(&state, &id, owner.owner_id.as_deref()).await?;
    let removed = route_records::deactivate_route_record(state.db().pool(), &id)
        .await
        .map_err(|err| internal_error("Failed to delete route", err))?;
    if !removed {
        return Err(not_found("Route"));
    }

    tracing::info!("Deleted route {}", id);
    Ok(Json(json!({ "message": "Route deleted successfully" })))
}

pub async fn select_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
    payload: Result<Json<SelectRouteRequest>, JsonRejection>,
) -> Result<Json<RouteRecord>, ApiError> {
    let request = json_body(payload)?;
    let mut record = load_owned_record(&state, &id, owner.owner_id.as_deref()).await?;

    let updated = route_records::update_selected_route(state.db().pool(), &id, request.route_type)
        .await
        .map_err(|err| internal_error("Failed to update route selection", err))?;
    if !updated {
        return Err(not_found("Route"));
    }

    record.selected_route = request.route_type;
    Ok(Json(record))
}

pub async fn route_stats(
    State(state): State<Arc<AppState>>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<RouteStats>, ApiError> {
    let records = route_records::load_active_records(state.db().pool(), owner.owner_id.as_deref())
        .await
        .map_err(|err| internal_error("Failed to load route statistics", err))?;
    Ok(Json(RouteStats::from_records(&records)))
}

/// Load an active record, rejecting callers that name a different owner.
async fn load_owned_record(
    state: &AppState,
    id: &str,
    owner_id: Option<&str>,
) -> Result<RouteRecord, ApiError> {
    let record = route_records::load_route_record(state.db().pool(), id)
        .await
        .map_err(|err| internal_error("Failed to load route", err))?
        .ok_or_else(|| not_found("Route"))?;

    if let Some(owner_id) = owner_id {
        if record.owner_id.as_deref() != Some(owner_id) {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Not authorized to access this route" })),
            ));
        }
    }
    Ok(record)
}
