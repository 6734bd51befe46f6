//! Route alternative synthesis.
//!
//! There is no road network behind this: every alternative is the straight
//! origin/destination pair, with distance and duration derived from the
//! great-circle distance through a fixed per-kind profile.

use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;
use crate::geo::distance_meters;
use crate::models::{Coordinate, RouteAlternative, RouteKind, RouteStep};

/// Distance multiplier and assumed average speed for one route kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteProfile {
    pub distance_multiplier: f64,
    pub speed_mps: f64,
}

impl RouteProfile {
    /// ~50 km/h
    pub const URBAN_SPEED_MPS: f64 = 13.89;
    /// ~45 km/h
    pub const LOCAL_SPEED_MPS: f64 = 12.5;

    pub fn for_kind(kind: RouteKind) -> Self {
        match kind {
            RouteKind::Fastest => Self {
                distance_multiplier: 1.0,
                speed_mps: Self::URBAN_SPEED_MPS,
            },
            RouteKind::Shortest => Self {
                distance_multiplier: 0.95,
                speed_mps: Self::LOCAL_SPEED_MPS,
            },
            RouteKind::Safest => Self {
                distance_multiplier: 1.10,
                speed_mps: Self::URBAN_SPEED_MPS,
            },
        }
    }

    pub fn distance_m(&self, base_distance_m: f64) -> f64 {
        base_distance_m * self.distance_multiplier
    }

    pub fn duration_s(&self, distance_m: f64) -> f64 {
        distance_m / self.speed_mps
    }
}

/// Build the three unscored alternatives between `origin` and `destination`.
pub fn synthesize(
    origin: Coordinate,
    destination: Coordinate,
) -> Result<Vec<RouteAlternative>, EvaluationError> {
    synthesize_to(origin, destination, "destination")
}

/// Like [`synthesize`], naming `destination_label` in step instructions.
pub fn synthesize_to(
    origin: Coordinate,
    destination: Coordinate,
    destination_label: &str,
) -> Result<Vec<RouteAlternative>, EvaluationError> {
    let origin = origin.validate("origin")?;
    let destination = destination.validate("destination")?;
    let base_distance = distance_meters(origin, destination);

    let alternatives = RouteKind::ALL
        .iter()
        .map(|&kind| {
            let profile = RouteProfile::for_kind(kind);
            let distance_m = profile.distance_m(base_distance);
            let duration_s = profile.duration_s(distance_m);
            RouteAlternative {
                kind,
                distance_m,
                duration_s,
                waypoints: vec![origin, destination],
                steps: vec![RouteStep {
                    instruction: kind.instruction(destination_label),
                    distance_m,
                    duration_s,
                    coordinates: destination,
                }],
                matched_hazard_ids: Vec::new(),
                hazard_count: 0,
                safety_score: 100,
            }
        })
        .collect();

    Ok(alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GALLE_FACE: Coordinate = Coordinate::new(79.8612, 6.9271);
    const KANDY: Coordinate = Coordinate::new(80.6337, 7.2906);

    fn find(alts: &[RouteAlternative], kind: RouteKind) -> &RouteAlternative {
        alts.iter().find(|alt| alt.kind == kind).expect("kind present")
    }

    #[test]
    fn produces_one_alternative_per_kind() {
        let alts = synthesize(GALLE_FACE, KANDY).unwrap();
        assert_eq!(alts.len(), 3);
        let kinds: Vec<RouteKind> = alts.iter().map(|alt| alt.kind).collect();
        assert_eq!(kinds, RouteKind::ALL.to_vec());
    }

    #[test]
    fn applies_kind_profiles() {
        let alts = synthesize(GALLE_FACE, KANDY).unwrap();
        let base = distance_meters(GALLE_FACE, KANDY);

        let fastest = find(&alts, RouteKind::Fastest);
        let shortest = find(&alts, RouteKind::Shortest);
        let safest = find(&alts, RouteKind::Safest);

        assert_eq!(fastest.distance_m, base);
        assert!((shortest.distance_m - base * 0.95).abs() < 1e-6);
        assert!((safest.distance_m - base * 1.10).abs() < 1e-6);
        assert!(safest.distance_m > fastest.distance_m);

        assert!((fastest.duration_s - base / 13.89).abs() < 1e-6);
        assert!((shortest.duration_s - base * 0.95 / 12.5).abs() < 1e-6);
    }

    #[test]
    fn waypoints_are_the_endpoints() {
        let alts = synthesize(GALLE_FACE, KANDY).unwrap();
        for alt in &alts {
            assert_eq!(alt.waypoints, vec![GALLE_FACE, KANDY]);
            assert_eq!(alt.steps.len(), 1);
            assert_eq!(alt.steps[0].coordinates, KANDY);
        }
    }

    #[test]
    fn step_instructions_name_the_destination() {
        let alts = synthesize_to(GALLE_FACE, KANDY, "Kandy").unwrap();
        assert_eq!(find(&alts, RouteKind::Fastest).steps[0].instruction, "Head to Kandy");
        assert_eq!(
            find(&alts, RouteKind::Safest).steps[0].instruction,
            "Take the safest route to Kandy"
        );
    }

    #[test]
    fn same_origin_and_destination_gives_zero_length_routes() {
        let alts = synthesize(KANDY, KANDY).unwrap();
        for alt in &alts {
            assert_eq!(alt.distance_m, 0.0);
            assert_eq!(alt.duration_s, 0.0);
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let err = synthesize(Coordinate::new(200.0, 0.0), KANDY).unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidCoordinate { field: "origin", .. }));

        let err = synthesize(GALLE_FACE, Coordinate::new(0.0, -91.0)).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::InvalidCoordinate { field: "destination", .. }
        ));
    }
}
