pub mod error;
pub mod evaluator;
pub mod geo;
pub mod history;
pub mod hazard_query;
pub mod models;
pub mod rules;
pub mod synthesizer;

pub use error::EvaluationError;
pub use evaluator::{calculate_safety_score, evaluate_trip, hazard_query_for, SafetyEvaluator};
pub use geo::{distance_meters, is_near};
pub use hazard_query::{HazardFetch, HazardQuery};
pub use history::{RoutePreferences, RouteRecord, RouteStats};
pub use models::{
    Coordinate, EvaluationResult, HazardReport, HazardStatus, HazardType, Place, RouteAlternative,
    RouteKind, RouteStep, Severity, TripRequest,
};
pub use rules::ScoringRules;
pub use synthesizer::{synthesize, synthesize_to, RouteProfile};
