//! REST API router.

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::api::{hazards, request_id, route_plans};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    let route_routes = Router::new()
        .route("/v1/routes/calculate", post(route_plans::calculate_route))
        .route("/v1/routes/history", get(route_plans::route_history))
        .route("/v1/routes/stats", get(route_plans::route_stats))
        .route(
            "/v1/routes/:id",
            get(route_plans::get_route).delete(route_plans::delete_route),
        )
        .route("/v1/routes/:id/select", patch(route_plans::select_route));

    let hazard_routes = Router::new()
        .route(
            "/v1/hazards",
            get(hazards::list_hazards).post(hazards::create_hazard),
        )
        .route("/v1/hazards/nearby", get(hazards::nearby_hazards))
        .route(
            "/v1/hazards/:id",
            get(hazards::get_hazard).delete(hazards::delete_hazard),
        )
        .route("/v1/hazards/:id/status", patch(hazards::update_hazard_status));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(route_routes)
        .merge(hazard_routes)
        .layer(middleware::from_fn(request_id::ensure_request_id))
}
