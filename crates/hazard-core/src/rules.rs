//! Scoring policy and hazard lookup thresholds.

use serde::{Deserialize, Serialize};

use crate::models::Severity;

/// Configuration for hazard matching and safety scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// A hazard within this many meters of a waypoint is on the route
    pub proximity_threshold_m: f64,
    /// Score of a route with no matched hazards
    pub base_score: u8,
    /// Points deducted per matched hazard, by severity
    pub penalties: SeverityPenalties,
    /// Radius of the nearby-hazard lookup around the trip midpoint
    pub query_radius_m: f64,
    /// Maximum number of hazards returned by the nearby lookup
    pub query_limit: usize,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            proximity_threshold_m: 200.0,
            base_score: 100,
            penalties: SeverityPenalties::default(),
            query_radius_m: 5_000.0,
            query_limit: 50,
        }
    }
}

impl ScoringRules {
    pub fn penalty_for(&self, severity: Severity) -> u32 {
        self.penalties.for_severity(severity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityPenalties {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self {
            low: 5,
            medium: 10,
            high: 15,
            critical: 20,
        }
    }
}

impl SeverityPenalties {
    pub fn for_severity(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}
