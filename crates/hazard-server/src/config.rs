//! Server configuration from environment.

use hazard_core::ScoringRules;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    pub hazard_query_radius_m: f64,
    pub hazard_query_limit: usize,
    pub hazard_query_timeout: Duration,
    pub proximity_threshold_m: f64,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = ScoringRules::default();
        Self {
            server_port: parse_env("HAZARD_ROUTE_PORT").unwrap_or(3000),
            database_path: env::var("HAZARD_ROUTE_DB_PATH")
                .unwrap_or_else(|_| "data/hazard_route.db".to_string()),
            database_max_connections: parse_env("HAZARD_ROUTE_DB_MAX_CONNECTIONS").unwrap_or(5),
            hazard_query_radius_m: parse_env("HAZARD_QUERY_RADIUS_M")
                .filter(|radius: &f64| radius.is_finite() && *radius > 0.0)
                .unwrap_or(defaults.query_radius_m),
            hazard_query_limit: parse_env("HAZARD_QUERY_LIMIT")
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(defaults.query_limit),
            hazard_query_timeout: Duration::from_millis(
                parse_env("HAZARD_QUERY_TIMEOUT_MS").unwrap_or(5_000),
            ),
            proximity_threshold_m: parse_env("HAZARD_PROXIMITY_THRESHOLD_M")
                .filter(|threshold: &f64| threshold.is_finite() && *threshold >= 0.0)
                .unwrap_or(defaults.proximity_threshold_m),
        }
    }

    /// Scoring policy with the configured lookup and matching overrides.
    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            proximity_threshold_m: self.proximity_threshold_m,
            query_radius_m: self.hazard_query_radius_m,
            query_limit: self.hazard_query_limit,
            ..ScoringRules::default()
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_rules_carry_overrides() {
        let mut config = Config::from_env();
        config.proximity_threshold_m = 350.0;
        config.hazard_query_limit = 10;

        let rules = config.scoring_rules();
        assert_eq!(rules.proximity_threshold_m, 350.0);
        assert_eq!(rules.query_limit, 10);
        assert_eq!(rules.base_score, 100);
    }
}
