//! Input errors raised before any route is computed.

use thiserror::Error;

/// Invalid caller input. Nothing is computed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Coordinate outside WGS84 bounds or not finite.
    #[error("{field} coordinate ({lon}, {lat}) is out of range")]
    InvalidCoordinate {
        field: &'static str,
        lon: f64,
        lat: f64,
    },
    #[error("{0} address is required")]
    MissingAddress(&'static str),
}
