//! Application state: database handle plus an in-memory hazard cache.

use anyhow::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hazard_core::{HazardReport, HazardStatus, ScoringRules};

use crate::config::Config;
use crate::persistence::{self, Database};

/// Thread-safe state shared by all handlers.
///
/// Hazards are written through to SQLite and mirrored in `hazards`; the
/// mirror serves the fallback lookup when the geospatial query fails.
pub struct AppState {
    db: Database,
    config: Config,
    rules: ScoringRules,
    hazards: DashMap<String, HazardReport>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let rules = config.scoring_rules();
        Self {
            db,
            config,
            rules,
            hazards: DashMap::new(),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Warm the hazard cache from the database.
    pub async fn load_from_database(&self) -> Result<usize> {
        let hazards = persistence::hazards::load_all_hazards(self.db.pool()).await?;
        let count = hazards.len();
        self.hazards.clear();
        for hazard in hazards {
            self.hazards.insert(hazard.id.clone(), hazard);
        }
        tracing::info!("Loaded {} hazards into cache", count);
        Ok(count)
    }

    /// Persist a hazard and update the cache.
    pub async fn save_hazard(&self, hazard: HazardReport) -> Result<HazardReport> {
        persistence::hazards::upsert_hazard(self.db.pool(), &hazard).await?;
        self.hazards.insert(hazard.id.clone(), hazard.clone());
        Ok(hazard)
    }

    pub fn cached_hazard(&self, id: &str) -> Option<HazardReport> {
        self.hazards.get(id).map(|entry| entry.value().clone())
    }

    /// Update a hazard's status in storage and refresh the cached copy from the stored row.
    pub async fn update_hazard_status(
        &self,
        id: &str,
        status: HazardStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<HazardReport>> {
        let updated =
            persistence::hazards::update_hazard_status(self.db.pool(), id, status, at).await?;
        if let Some(hazard) = &updated {
            self.hazards.insert(hazard.id.clone(), hazard.clone());
        }
        Ok(updated)
    }

    /// Mark a hazard inactive in storage and cache.
    pub async fn deactivate_hazard(&self, id: &str) -> Result<bool> {
        let found = persistence::hazards::deactivate_hazard(self.db.pool(), id).await?;
        if let Some(mut entry) = self.hazards.get_mut(id) {
            entry.is_active = false;
        }
        Ok(found)
    }

    /// Eligible cached hazards, newest first, capped at `limit`. Not distance-filtered.
    pub fn fallback_hazards(&self, limit: usize) -> Vec<HazardReport> {
        let mut hazards: Vec<HazardReport> = self
            .hazards
            .iter()
            .filter(|entry| entry.value().is_eligible())
            .map(|entry| entry.value().clone())
            .collect();
        hazards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hazards.truncate(limit);
        hazards
    }
}
