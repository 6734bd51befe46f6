//! Hazard matching and safety scoring for route alternatives.
//!
//! A hazard counts against an alternative when it is eligible (active and
//! not resolved) and lies within the proximity threshold of one of the
//! alternative's waypoints. Every matched hazard deducts a severity-based
//! penalty from the base score; the score never drops below zero.
//!
//! The `safest` label is attached by the synthesizer before scoring and is
//! not reassigned afterwards, even when another alternative scores higher.
//! Use [`EvaluationResult::ranking`] for score order.

use tracing::debug;

use crate::error::EvaluationError;
use crate::geo::is_near;
use crate::hazard_query::{HazardFetch, HazardQuery};
use crate::models::{EvaluationResult, HazardReport, RouteAlternative, RouteKind, TripRequest};
use crate::rules::ScoringRules;
use crate::synthesizer::synthesize_to;

/// Deduct severity penalties for `hazards` from the base score, clamped at zero.
pub fn calculate_safety_score<'a, I>(hazards: I, rules: &ScoringRules) -> u8
where
    I: IntoIterator<Item = &'a HazardReport>,
{
    let mut hazards = hazards.into_iter().peekable();
    if hazards.peek().is_none() {
        return rules.base_score;
    }

    let deduction: u32 = hazards
        .map(|hazard| rules.penalty_for(hazard.severity))
        .fold(0u32, u32::saturating_add);
    u32::from(rules.base_score).saturating_sub(deduction) as u8
}

/// Attaches matched hazards and a safety score to route alternatives.
#[derive(Debug, Clone, Default)]
pub struct SafetyEvaluator {
    rules: ScoringRules,
}

impl SafetyEvaluator {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Eligible hazards near any waypoint of `alternative`.
    pub fn match_hazards<'a>(
        &self,
        alternative: &RouteAlternative,
        hazards: &'a [HazardReport],
    ) -> Vec<&'a HazardReport> {
        hazards
            .iter()
            .filter(|hazard| hazard.is_eligible())
            .filter(|hazard| {
                is_near(
                    hazard.location,
                    &alternative.waypoints,
                    self.rules.proximity_threshold_m,
                )
            })
            .collect()
    }

    /// Populate matched ids, hazard count and safety score on `alternative`.
    pub fn score_alternative(&self, alternative: &mut RouteAlternative, hazards: &[HazardReport]) {
        let matched = self.match_hazards(alternative, hazards);
        alternative.safety_score = calculate_safety_score(matched.iter().copied(), &self.rules);
        alternative.hazard_count = matched.len() as u32;
        alternative.matched_hazard_ids = matched.into_iter().map(|hazard| hazard.id.clone()).collect();

        debug!(
            kind = alternative.kind.as_str(),
            hazard_count = alternative.hazard_count,
            safety_score = alternative.safety_score,
            "scored route alternative"
        );
    }

    /// Score every alternative against the fetched hazards.
    ///
    /// A degraded fetch is scored the same way as a complete one; its reason
    /// is carried on the result.
    pub fn evaluate(
        &self,
        mut alternatives: Vec<RouteAlternative>,
        fetch: HazardFetch,
    ) -> EvaluationResult {
        let (hazards, degraded) = fetch.into_parts();
        let nearby_hazards: Vec<HazardReport> =
            hazards.into_iter().filter(HazardReport::is_eligible).collect();

        for alternative in &mut alternatives {
            self.score_alternative(alternative, &nearby_hazards);
        }

        EvaluationResult {
            alternatives,
            nearby_hazards,
            selected_route: RouteKind::Safest,
            degraded,
        }
    }
}

/// Validate a trip, synthesize its alternatives and score them.
pub fn evaluate_trip(
    trip: &TripRequest,
    fetch: HazardFetch,
    rules: &ScoringRules,
) -> Result<EvaluationResult, EvaluationError> {
    trip.validate()?;
    let alternatives = synthesize_to(
        trip.origin.coordinates,
        trip.destination.coordinates,
        &trip.destination.address,
    )?;
    Ok(SafetyEvaluator::new(rules.clone()).evaluate(alternatives, fetch))
}

/// The lookup a caller should run before [`evaluate_trip`].
pub fn hazard_query_for(trip: &TripRequest, rules: &ScoringRules) -> HazardQuery {
    HazardQuery::for_trip(trip.origin.coordinates, trip.destination.coordinates, rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, HazardStatus, Place, Severity};
    use crate::synthesizer::synthesize;

    const GALLE_FACE: Coordinate = Coordinate::new(79.8612, 6.9271);
    const KANDY: Coordinate = Coordinate::new(80.6337, 7.2906);

    fn trip() -> TripRequest {
        TripRequest {
            origin: Place::new("Galle Face", GALLE_FACE),
            destination: Place::new("Kandy", KANDY),
        }
    }

    fn critical_at_origin(id: &str) -> HazardReport {
        HazardReport::new(id, GALLE_FACE, Severity::Critical).with_status(HazardStatus::Verified)
    }

    fn evaluate(hazards: Vec<HazardReport>) -> EvaluationResult {
        evaluate_trip(&trip(), hazards.into(), &ScoringRules::default()).unwrap()
    }

    #[test]
    fn empty_hazard_list_scores_100() {
        let result = evaluate(Vec::new());
        assert_eq!(result.alternatives.len(), 3);
        for alt in &result.alternatives {
            assert_eq!(alt.safety_score, 100);
            assert_eq!(alt.hazard_count, 0);
            assert!(alt.matched_hazard_ids.is_empty());
        }
        assert!(result.nearby_hazards.is_empty());
    }

    #[test]
    fn critical_hazard_at_origin_hits_every_alternative() {
        let result = evaluate(vec![critical_at_origin("h-critical")]);
        for alt in &result.alternatives {
            assert_eq!(alt.hazard_count, 1);
            assert_eq!(alt.safety_score, 80);
            assert_eq!(alt.matched_hazard_ids, vec!["h-critical".to_string()]);
        }
    }

    #[test]
    fn inactive_or_resolved_hazards_are_ignored() {
        let inactive = critical_at_origin("inactive").with_active(false);
        let resolved = critical_at_origin("resolved").with_status(HazardStatus::Resolved);
        let result = evaluate(vec![inactive, resolved]);
        for alt in &result.alternatives {
            assert_eq!(alt.hazard_count, 0);
            assert_eq!(alt.safety_score, 100);
        }
        assert!(result.nearby_hazards.is_empty());
    }

    #[test]
    fn severity_penalties() {
        let rules = ScoringRules::default();
        let at = |severity| HazardReport::new("h", GALLE_FACE, severity);
        assert_eq!(calculate_safety_score(&[at(Severity::Critical)], &rules), 80);
        assert_eq!(calculate_safety_score(&[at(Severity::High)], &rules), 85);
        assert_eq!(calculate_safety_score(&[at(Severity::Medium)], &rules), 90);
        assert_eq!(calculate_safety_score(&[at(Severity::Low)], &rules), 95);
        assert_eq!(calculate_safety_score(&Vec::<HazardReport>::new(), &rules), 100);
    }

    #[test]
    fn score_clamps_at_zero() {
        let five: Vec<HazardReport> = (0..5).map(|i| critical_at_origin(&format!("c{i}"))).collect();
        let result = evaluate(five);
        assert!(result.alternatives.iter().all(|alt| alt.safety_score == 0));

        let nine: Vec<HazardReport> = (0..9).map(|i| critical_at_origin(&format!("c{i}"))).collect();
        let result = evaluate(nine);
        for alt in &result.alternatives {
            assert_eq!(alt.safety_score, 0);
            assert_eq!(alt.hazard_count, 9);
        }
    }

    #[test]
    fn hazards_beyond_threshold_are_not_matched() {
        // ~330m north of the origin.
        let far = HazardReport::new(
            "far",
            Coordinate::new(GALLE_FACE.lon, GALLE_FACE.lat + 0.003),
            Severity::Critical,
        );
        // ~110m north of the destination.
        let near = HazardReport::new(
            "near",
            Coordinate::new(KANDY.lon, KANDY.lat + 0.001),
            Severity::Medium,
        );
        let result = evaluate(vec![far, near]);
        for alt in &result.alternatives {
            assert_eq!(alt.matched_hazard_ids, vec!["near".to_string()]);
            assert_eq!(alt.safety_score, 90);
        }
        // Both are still reported as nearby for display.
        assert_eq!(result.nearby_hazards.len(), 2);
    }

    #[test]
    fn evaluator_filters_even_when_caller_did_not() {
        let alternatives = synthesize(GALLE_FACE, KANDY).unwrap();
        let evaluator = SafetyEvaluator::default();
        let resolved = critical_at_origin("resolved").with_status(HazardStatus::Resolved);
        let result = evaluator.evaluate(alternatives, HazardFetch::Complete(vec![resolved]));
        assert!(result.alternatives.iter().all(|alt| alt.safety_score == 100));
    }

    #[test]
    fn degraded_fetch_still_scores() {
        let fetch = HazardFetch::degraded(vec![critical_at_origin("h1")], "geospatial index unavailable");
        let result = evaluate_trip(&trip(), fetch, &ScoringRules::default()).unwrap();
        assert!(result.is_degraded());
        assert_eq!(result.degraded.as_deref(), Some("geospatial index unavailable"));
        assert!(result.alternatives.iter().all(|alt| alt.safety_score == 80));
    }

    #[test]
    fn safest_label_is_fixed_before_scoring() {
        // A hazard near only the destination hits every alternative equally, so
        // ranking falls back to kind order and safest is not promoted.
        let result = evaluate(vec![HazardReport::new("h", KANDY, Severity::High)]);
        assert_eq!(result.selected_route, RouteKind::Safest);
        assert_eq!(
            result.ranking(),
            vec![RouteKind::Fastest, RouteKind::Shortest, RouteKind::Safest]
        );

        let safest = result.alternative(RouteKind::Safest).unwrap();
        let fastest = result.alternative(RouteKind::Fastest).unwrap();
        assert!((safest.distance_m / fastest.distance_m - 1.10).abs() < 1e-9);
    }

    #[test]
    fn ranking_orders_by_score() {
        let mut alternatives = synthesize(GALLE_FACE, KANDY).unwrap();
        // Give the fastest alternative an extra waypoint next to a hazard.
        let detour = Coordinate::new(80.0, 7.0);
        alternatives[0].waypoints.insert(1, detour);
        let hazard = HazardReport::new("detour", detour, Severity::High);

        let result = SafetyEvaluator::default().evaluate(alternatives, vec![hazard].into());
        assert_eq!(
            result.ranking(),
            vec![RouteKind::Shortest, RouteKind::Safest, RouteKind::Fastest]
        );
        assert_eq!(result.selected_route, RouteKind::Safest);
    }

    #[test]
    fn invalid_trip_is_rejected() {
        let mut bad = trip();
        bad.destination.coordinates = Coordinate::new(80.6337, 97.0);
        let err = evaluate_trip(&bad, HazardFetch::Complete(Vec::new()), &ScoringRules::default())
            .unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::InvalidCoordinate { field: "destination", .. }
        ));
    }

    #[test]
    fn custom_threshold_widens_matching() {
        let rules = ScoringRules {
            proximity_threshold_m: 500.0,
            ..ScoringRules::default()
        };
        let hazard = HazardReport::new(
            "h",
            Coordinate::new(GALLE_FACE.lon, GALLE_FACE.lat + 0.003),
            Severity::Low,
        );
        let result = evaluate_trip(&trip(), vec![hazard].into(), &rules).unwrap();
        assert!(result.alternatives.iter().all(|alt| alt.safety_score == 95));
    }
}
