//! Core data models for hazard reports and route alternatives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// WGS84 position, serialized as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Check bounds, naming `field` in the error.
    pub fn validate(&self, field: &'static str) -> Result<Self, EvaluationError> {
        if self.is_valid() {
            Ok(*self)
        } else {
            Err(EvaluationError::InvalidCoordinate {
                field,
                lon: self.lon,
                lat: self.lat,
            })
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.lon, coord.lat]
    }
}

/// Hazard severity. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(Severity::Low),
            "Medium" => Some(Severity::Medium),
            "High" => Some(Severity::High),
            "Critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardStatus {
    #[default]
    Pending,
    Verified,
    /// Historical; never affects scoring.
    Resolved,
}

impl HazardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardStatus::Pending => "Pending",
            HazardStatus::Verified => "Verified",
            HazardStatus::Resolved => "Resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(HazardStatus::Pending),
            "Verified" => Some(HazardStatus::Verified),
            "Resolved" => Some(HazardStatus::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardType {
    Pothole,
    Debris,
    Flooding,
    Ice,
    Accident,
    #[serde(rename = "Road Closure")]
    RoadClosure,
    Construction,
    #[serde(rename = "Broken Traffic Light")]
    BrokenTrafficLight,
    #[default]
    Other,
}

impl HazardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::Pothole => "Pothole",
            HazardType::Debris => "Debris",
            HazardType::Flooding => "Flooding",
            HazardType::Ice => "Ice",
            HazardType::Accident => "Accident",
            HazardType::RoadClosure => "Road Closure",
            HazardType::Construction => "Construction",
            HazardType::BrokenTrafficLight => "Broken Traffic Light",
            HazardType::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pothole" => Some(HazardType::Pothole),
            "Debris" => Some(HazardType::Debris),
            "Flooding" => Some(HazardType::Flooding),
            "Ice" => Some(HazardType::Ice),
            "Accident" => Some(HazardType::Accident),
            "Road Closure" => Some(HazardType::RoadClosure),
            "Construction" => Some(HazardType::Construction),
            "Broken Traffic Light" => Some(HazardType::BrokenTrafficLight),
            "Other" => Some(HazardType::Other),
            _ => None,
        }
    }
}

/// A user-submitted hazard report, as a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardReport {
    pub id: String,
    #[serde(default)]
    pub hazard_type: HazardType,
    #[serde(default)]
    pub description: String,
    pub location: Coordinate,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: HazardStatus,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl HazardReport {
    /// Minimal report with defaults for everything scoring doesn't read.
    pub fn new(id: impl Into<String>, location: Coordinate, severity: Severity) -> Self {
        Self {
            id: id.into(),
            hazard_type: HazardType::default(),
            description: String::new(),
            location,
            address: String::new(),
            severity,
            status: HazardStatus::Pending,
            is_active: true,
            reported_by: None,
            photo: None,
            created_at: Utc::now(),
            verified_at: None,
            resolved_at: None,
        }
    }

    pub fn with_status(mut self, status: HazardStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Active and not yet resolved.
    pub fn is_eligible(&self) -> bool {
        self.is_active && matches!(self.status, HazardStatus::Pending | HazardStatus::Verified)
    }

    /// Move to `status`, stamping the verification/resolution time on first entry.
    pub fn apply_status(&mut self, status: HazardStatus, at: DateTime<Utc>) {
        match status {
            HazardStatus::Verified if self.verified_at.is_none() => self.verified_at = Some(at),
            HazardStatus::Resolved if self.resolved_at.is_none() => self.resolved_at = Some(at),
            _ => {}
        }
        self.status = status;
    }
}

/// Named route alternative. Each kind appears exactly once per evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Fastest,
    Shortest,
    #[default]
    Safest,
}

impl RouteKind {
    pub const ALL: [RouteKind; 3] = [RouteKind::Fastest, RouteKind::Shortest, RouteKind::Safest];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Fastest => "fastest",
            RouteKind::Shortest => "shortest",
            RouteKind::Safest => "safest",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fastest" => Some(RouteKind::Fastest),
            "shortest" => Some(RouteKind::Shortest),
            "safest" => Some(RouteKind::Safest),
            _ => None,
        }
    }

    pub fn instruction(&self, destination: &str) -> String {
        match self {
            RouteKind::Fastest => format!("Head to {destination}"),
            RouteKind::Shortest => format!("Take the shortest route to {destination}"),
            RouteKind::Safest => format!("Take the safest route to {destination}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance_m: f64,
    pub duration_s: f64,
    pub coordinates: Coordinate,
}

/// One candidate path between origin and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAlternative {
    pub kind: RouteKind,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Proxy for the path; at minimum origin and destination.
    pub waypoints: Vec<Coordinate>,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
    #[serde(default)]
    pub matched_hazard_ids: Vec<String>,
    #[serde(default)]
    pub hazard_count: u32,
    pub safety_score: u8,
}

/// Named endpoint of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub address: String,
    pub coordinates: Coordinate,
}

impl Place {
    pub fn new(address: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            address: address.into(),
            coordinates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub origin: Place,
    pub destination: Place,
}

impl TripRequest {
    pub fn validate(&self) -> Result<(), EvaluationError> {
        if self.origin.address.trim().is_empty() {
            return Err(EvaluationError::MissingAddress("origin"));
        }
        if self.destination.address.trim().is_empty() {
            return Err(EvaluationError::MissingAddress("destination"));
        }
        self.origin.coordinates.validate("origin")?;
        self.destination.coordinates.validate("destination")?;
        Ok(())
    }
}

/// Output of one evaluation: one scored alternative per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Always in `RouteKind::ALL` order.
    pub alternatives: Vec<RouteAlternative>,
    pub nearby_hazards: Vec<HazardReport>,
    pub selected_route: RouteKind,
    /// Set when the hazard lookup fell back to a degraded source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl EvaluationResult {
    pub fn alternative(&self, kind: RouteKind) -> Option<&RouteAlternative> {
        self.alternatives.iter().find(|alt| alt.kind == kind)
    }

    /// Kinds ordered by safety score, best first. Ties keep fastest/shortest/safest order.
    pub fn ranking(&self) -> Vec<RouteKind> {
        let mut ranked: Vec<&RouteAlternative> = self.alternatives.iter().collect();
        ranked.sort_by(|a, b| b.safety_score.cmp(&a.safety_score));
        ranked.into_iter().map(|alt| alt.kind).collect()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_serializes_as_lon_lat_pair() {
        let coord = Coordinate::new(79.8612, 6.9271);
        let json = serde_json::to_string(&coord).unwrap();
        assert_eq!(json, "[79.8612,6.9271]");

        let parsed: Coordinate = serde_json::from_str("[80.6337,7.2906]").unwrap();
        assert_eq!(parsed, Coordinate::new(80.6337, 7.2906));
    }

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinate::new(180.0, -90.0).is_valid());
        assert!(!Coordinate::new(180.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 91.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());

        let err = Coordinate::new(0.0, 95.0).validate("origin").unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidCoordinate { field: "origin", .. }));
    }

    #[test]
    fn only_active_unresolved_hazards_are_eligible() {
        let base = HazardReport::new("h1", Coordinate::new(0.0, 0.0), Severity::High);
        assert!(base.is_eligible());
        assert!(base.clone().with_status(HazardStatus::Verified).is_eligible());
        assert!(!base.clone().with_status(HazardStatus::Resolved).is_eligible());
        assert!(!base.with_active(false).is_eligible());
    }

    #[test]
    fn status_changes_stamp_timestamps_once() {
        let mut hazard = HazardReport::new("h1", Coordinate::new(0.0, 0.0), Severity::Low);
        let first = Utc::now();
        hazard.apply_status(HazardStatus::Verified, first);
        assert_eq!(hazard.verified_at, Some(first));

        let later = first + chrono::Duration::minutes(5);
        hazard.apply_status(HazardStatus::Verified, later);
        assert_eq!(hazard.verified_at, Some(first));

        hazard.apply_status(HazardStatus::Resolved, later);
        assert_eq!(hazard.status, HazardStatus::Resolved);
        assert_eq!(hazard.resolved_at, Some(later));
        assert!(!hazard.is_eligible());
    }

    #[test]
    fn hazard_type_uses_display_names() {
        let json = serde_json::to_string(&HazardType::BrokenTrafficLight).unwrap();
        assert_eq!(json, "\"Broken Traffic Light\"");
        assert_eq!(HazardType::parse("Road Closure"), Some(HazardType::RoadClosure));
    }

    #[test]
    fn trip_request_requires_addresses() {
        let trip = TripRequest {
            origin: Place::new("", Coordinate::new(79.8612, 6.9271)),
            destination: Place::new("Kandy", Coordinate::new(80.6337, 7.2906)),
        };
        assert_eq!(trip.validate(), Err(EvaluationError::MissingAddress("origin")));
    }
}
