//! Persisted evaluation records and per-owner route statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{EvaluationResult, Place, RouteAlternative, RouteKind, TripRequest};

/// One stored evaluation, kept for history and favoriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: String,
    pub owner_id: Option<String>,
    pub origin: Place,
    pub destination: Place,
    pub routes: Vec<RouteAlternative>,
    pub selected_route: RouteKind,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl RouteRecord {
    pub fn from_evaluation(
        id: impl Into<String>,
        owner_id: Option<String>,
        trip: &TripRequest,
        result: &EvaluationResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id,
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            routes: result.alternatives.clone(),
            selected_route: result.selected_route,
            is_active: true,
            created_at,
        }
    }

    pub fn selected(&self) -> Option<&RouteAlternative> {
        self.routes.iter().find(|route| route.kind == self.selected_route)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePreferences {
    pub fastest: u64,
    pub shortest: u64,
    pub safest: u64,
}

impl RoutePreferences {
    fn record(&mut self, kind: RouteKind) {
        match kind {
            RouteKind::Fastest => self.fastest += 1,
            RouteKind::Shortest => self.shortest += 1,
            RouteKind::Safest => self.safest += 1,
        }
    }
}

/// Totals over the selected alternative of each record. Distances in
/// meters and durations in seconds, rounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub total_routes: u64,
    pub total_distance_m: f64,
    pub total_duration_s: f64,
    pub average_distance_m: f64,
    pub average_duration_s: f64,
    pub route_preferences: RoutePreferences,
}

impl RouteStats {
    /// Summarize active records; inactive ones are skipped.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RouteRecord>) -> Self {
        let mut total_routes = 0u64;
        let mut total_distance = 0.0;
        let mut total_duration = 0.0;
        let mut preferences = RoutePreferences::default();

        for record in records.into_iter().filter(|record| record.is_active) {
            total_routes += 1;
            if let Some(selected) = record.selected() {
                total_distance += selected.distance_m;
                total_duration += selected.duration_s;
            }
            preferences.record(record.selected_route);
        }

        let (average_distance, average_duration) = if total_routes > 0 {
            (
                total_distance / total_routes as f64,
                total_duration / total_routes as f64,
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            total_routes,
            total_distance_m: total_distance.round(),
            total_duration_s: total_duration.round(),
            average_distance_m: average_distance.round(),
            average_duration_s: average_duration.round(),
            route_preferences: preferences,
        }
    }
}
