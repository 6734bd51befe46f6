//! Contract for the nearby-hazard lookup that feeds an evaluation.
//!
//! The lookup itself happens outside the core. A failed or timed-out
//! geospatial query is reported as [`HazardFetch::Degraded`] with whatever
//! fallback list the caller could assemble, never as an error.

use serde::{Deserialize, Serialize};

use crate::geo::{distance_meters, midpoint, BoundingBox};
use crate::models::{Coordinate, HazardReport};
use crate::rules::ScoringRules;

/// Find up to `limit` eligible hazards within `radius_m` of `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardQuery {
    pub center: Coordinate,
    pub radius_m: f64,
    pub limit: usize,
}

impl HazardQuery {
    pub fn new(center: Coordinate, radius_m: f64, limit: usize) -> Self {
        Self {
            center,
            radius_m,
            limit,
        }
    }

    /// Query centred on the midpoint of a trip, sized by `rules`.
    pub fn for_trip(origin: Coordinate, destination: Coordinate, rules: &ScoringRules) -> Self {
        Self::new(
            midpoint(origin, destination),
            rules.query_radius_m,
            rules.query_limit,
        )
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.center, self.radius_m)
    }

    /// Eligible and within the radius.
    pub fn matches(&self, hazard: &HazardReport) -> bool {
        hazard.is_eligible() && distance_meters(self.center, hazard.location) <= self.radius_m
    }

    /// Apply the query to an in-memory list: nearest first, capped at `limit`.
    pub fn select(&self, hazards: impl IntoIterator<Item = HazardReport>) -> Vec<HazardReport> {
        let mut selected: Vec<(f64, HazardReport)> = hazards
            .into_iter()
            .filter(|hazard| self.matches(hazard))
            .map(|hazard| (distance_meters(self.center, hazard.location), hazard))
            .collect();
        selected.sort_by(|a, b| a.0.total_cmp(&b.0));
        selected.truncate(self.limit);
        selected.into_iter().map(|(_, hazard)| hazard).collect()
    }
}

/// Result of the hazard lookup boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum HazardFetch {
    Complete(Vec<HazardReport>),
    /// The geospatial lookup failed; `hazards` came from a fallback source.
    Degraded {
        hazards: Vec<HazardReport>,
        reason: String,
    },
}

impl HazardFetch {
    pub fn degraded(hazards: Vec<HazardReport>, reason: impl Into<String>) -> Self {
        HazardFetch::Degraded {
            hazards,
            reason: reason.into(),
        }
    }

    pub fn hazards(&self) -> &[HazardReport] {
        match self {
            HazardFetch::Complete(hazards) => hazards,
            HazardFetch::Degraded { hazards, .. } => hazards,
        }
    }

    pub fn degradation(&self) -> Option<&str> {
        match self {
            HazardFetch::Complete(_) => None,
            HazardFetch::Degraded { reason, .. } => Some(reason.as_str()),
        }
    }

    pub fn into_parts(self) -> (Vec<HazardReport>, Option<String>) {
        match self {
            HazardFetch::Complete(hazards) => (hazards, None),
            HazardFetch::Degraded { hazards, reason } => (hazards, Some(reason)),
        }
    }
}

impl From<Vec<HazardReport>> for HazardFetch {
    fn from(hazards: Vec<HazardReport>) -> Self {
        HazardFetch::Complete(hazards)
    }
}
