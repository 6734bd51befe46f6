//! Nearby-hazard lookup with graceful degradation.
//!
//! The geospatial query runs against SQLite under a timeout. If it fails or
//! times out, the cached eligible hazards (unbounded by distance, capped at
//! the query limit) are returned as a degraded fetch instead of an error.

use hazard_core::{HazardFetch, HazardQuery};
use tracing::{debug, warn};

use crate::persistence;
use crate::state::AppState;

pub async fn fetch_nearby_hazards(state: &AppState, query: &HazardQuery) -> HazardFetch {
    let timeout = state.config().hazard_query_timeout;
    let lookup = persistence::hazards::query_nearby(state.db().pool(), query);

    let reason = match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(hazards)) => {
            debug!(
                count = hazards.len(),
                radius_m = query.radius_m,
                "geospatial hazard query complete"
            );
            return HazardFetch::Complete(hazards);
        }
        Ok(Err(err)) => format!("geospatial query failed: {err}"),
        Err(_) => format!("geospatial query timed out after {}ms", timeout.as_millis()),
    };

    let fallback = state.fallback_hazards(query.limit);
    warn!(
        fallback_count = fallback.len(),
        "{}; falling back to cached hazards", reason
    );
    HazardFetch::degraded(fallback, reason)
}
