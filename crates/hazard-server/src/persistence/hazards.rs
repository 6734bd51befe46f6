//! Hazard report persistence operations.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use hazard_core::{Coordinate, HazardQuery, HazardReport, HazardStatus, HazardType, Severity};
use sqlx::SqlitePool;
use tracing::warn;

const HAZARD_COLUMNS: &str = "id, hazard_type, description, lon, lat, address, severity, status, \
     is_active, reported_by, photo, created_at, verified_at, resolved_at";

/// Insert or replace a hazard report.
pub async fn upsert_hazard(pool: &SqlitePool, hazard: &HazardReport) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO hazards (
            id, hazard_type, description, lon, lat, address,
            severity, status, is_active, reported_by, photo,
            created_at, verified_at, resolved_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            hazard_type = ?2, description = ?3, lon = ?4, lat = ?5, address = ?6,
            severity = ?7, status = ?8, is_active = ?9, reported_by = ?10, photo = ?11,
            verified_at = ?13, resolved_at = ?14, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&hazard.id)
    .bind(hazard.hazard_type.as_str())
    .bind(&hazard.description)
    .bind(hazard.location.lon)
    .bind(hazard.location.lat)
    .bind(&hazard.address)
    .bind(hazard.severity.as_str())
    .bind(hazard.status.as_str())
    .bind(hazard.is_active)
    .bind(&hazard.reported_by)
    .bind(&hazard.photo)
    .bind(hazard.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
    .bind(hazard.verified_at.map(|t| t.to_rfc3339()))
    .bind(hazard.resolved_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a single hazard by ID.
pub async fn load_hazard(pool: &SqlitePool, id: &str) -> Result<Option<HazardReport>> {
    let row = sqlx::query_as::<_, HazardRow>(&format!(
        "SELECT {HAZARD_COLUMNS} FROM hazards WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(HazardReport::try_from).transpose()
}

/// Load every hazard, for warming the in-memory cache.
pub async fn load_all_hazards(pool: &SqlitePool) -> Result<Vec<HazardReport>> {
    let rows = sqlx::query_as::<_, HazardRow>(&format!("SELECT {HAZARD_COLUMNS} FROM hazards"))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
}

/// Filters for paginated hazard listing.
#[derive(Debug, Clone, Default)]
pub struct HazardFilter {
    pub status: Option<HazardStatus>,
    pub severity: Option<Severity>,
    pub hazard_type: Option<HazardType>,
    pub include_inactive: bool,
}

/// List hazards newest first. Returns the page and the total match count.
pub async fn list_hazards(
    pool: &SqlitePool,
    filter: &HazardFilter,
    limit: u32,
    offset: u32,
) -> Result<(Vec<HazardReport>, u64)> {
    const WHERE: &str = "WHERE (?1 IS NULL OR status = ?1) \
         AND (?2 IS NULL OR severity = ?2) \
         AND (?3 IS NULL OR hazard_type = ?3) \
         AND (?4 OR is_active = 1)";

    let status = filter.status.map(|s| s.as_str());
    let severity = filter.severity.map(|s| s.as_str());
    let hazard_type = filter.hazard_type.map(|t| t.as_str());

    let rows = sqlx::query_as::<_, HazardRow>(&format!(
        "SELECT {HAZARD_COLUMNS} FROM hazards {WHERE} ORDER BY created_at DESC LIMIT ?5 OFFSET ?6"
    ))
    .bind(status)
    .bind(severity)
    .bind(hazard_type)
    .bind(filter.include_inactive)
    .bind(i64::from(limit))
    .bind(i64::from(offset))
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM hazards {WHERE}"))
        .bind(status)
        .bind(severity)
        .bind(hazard_type)
        .bind(filter.include_inactive)
        .fetch_one(pool)
        .await?;

    let hazards = rows
        .into_iter()
        .map(HazardReport::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok((hazards, total.max(0) as u64))
}

/// Geospatial lookup: eligible hazards within the query radius, nearest first.
///
/// The bounding box narrows candidates through the lat/lon index; the exact
/// radius and ordering are applied with haversine distances afterwards.
pub async fn query_nearby(pool: &SqlitePool, query: &HazardQuery) -> Result<Vec<HazardReport>> {
    let bbox = query.bounding_box();
    let rows = sqlx::query_as::<_, HazardRow>(&format!(
        "SELECT {HAZARD_COLUMNS} FROM hazards \
         WHERE is_active = 1 AND status IN ('Pending', 'Verified') \
         AND lat BETWEEN ?1 AND ?2 AND lon BETWEEN ?3 AND ?4"
    ))
    .bind(bbox.min_lat)
    .bind(bbox.max_lat)
    .bind(bbox.min_lon)
    .bind(bbox.max_lon)
    .fetch_all(pool)
    .await?;

    let candidates = rows
        .into_iter()
        .map(HazardReport::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(query.select(candidates))
}

/// Change only the status of a hazard, stamping `verified_at`/`resolved_at` on
/// first entry. Other columns (notably `is_active`) are left as stored.
/// Returns the updated hazard, or `None` if it doesn't exist.
pub async fn update_hazard_status(
    pool: &SqlitePool,
    id: &str,
    status: HazardStatus,
    at: DateTime<Utc>,
) -> Result<Option<HazardReport>> {
    let stamp = at.to_rfc3339_opts(SecondsFormat::Micros, true);
    let verified_at = (status == HazardStatus::Verified).then(|| stamp.clone());
    let resolved_at = (status == HazardStatus::Resolved).then_some(stamp);

    let result = sqlx::query(
        "UPDATE hazards SET status = ?2, \
         verified_at = COALESCE(verified_at, ?3), \
         resolved_at = COALESCE(resolved_at, ?4), \
         updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?1",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(verified_at)
    .bind(resolved_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    load_hazard(pool, id).await
}

/// Soft-delete a hazard. Returns false if it doesn't exist.
pub async fn deactivate_hazard(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE hazards SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE id = ?1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct HazardRow {
    id: String,
    hazard_type: String,
    description: String,
    lon: f64,
    lat: f64,
    address: String,
    severity: String,
    status: String,
    is_active: bool,
    reported_by: Option<String>,
    photo: Option<String>,
    created_at: String,
    verified_at: Option<String>,
    resolved_at: Option<String>,
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

impl TryFrom<HazardRow> for HazardReport {
    type Error = anyhow::Error;

    fn try_from(row: HazardRow) -> Result<Self> {
        let hazard_type = HazardType::parse(&row.hazard_type).unwrap_or_else(|| {
            warn!(
                "Unknown hazard type '{}' on hazard {}, using Other",
                row.hazard_type, row.id
            );
            HazardType::default()
        });
        let severity = Severity::parse(&row.severity)
            .ok_or_else(|| anyhow::anyhow!("unknown severity '{}' on hazard {}", row.severity, row.id))?;
        let status = HazardStatus::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("unknown status '{}' on hazard {}", row.status, row.id))?;

        let created_at = parse_timestamp(&row.created_at).unwrap_or_else(|| {
            warn!(
                "Unparseable created_at '{}' on hazard {}, using now",
                row.created_at, row.id
            );
            Utc::now()
        });

        Ok(HazardReport {
            id: row.id,
            hazard_type,
            description: row.description,
            location: Coordinate::new(row.lon, row.lat),
            address: row.address,
            severity,
            status,
            is_active: row.is_active,
            reported_by: row.reported_by,
            photo: row.photo,
            created_at,
            verified_at: row.verified_at.as_deref().and_then(parse_timestamp),
            resolved_at: row.resolved_at.as_deref().and_then(parse_timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    const COLOMBO: Coordinate = Coordinate::new(79.8612, 6.9271);

    #[tokio::test]
    async fn upsert_and_load_round_trip() {
        let db = init_database(":memory:", 1).await.unwrap();
        let mut hazard = HazardReport::new("h1", COLOMBO, Severity::High);
        hazard.hazard_type = HazardType::RoadClosure;
        hazard.address = "Galle Road".to_string();

        upsert_hazard(db.pool(), &hazard).await.unwrap();
        let loaded = load_hazard(db.pool(), "h1").await.unwrap().expect("hazard stored");
        assert_eq!(loaded.hazard_type, HazardType::RoadClosure);
        assert_eq!(loaded.severity, Severity::High);
        assert_eq!(loaded.location, COLOMBO);
        assert!(loaded.is_active);

        assert!(load_hazard(db.pool(), "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn nearby_query_excludes_far_and_ineligible() {
        let db = init_database(":memory:", 1).await.unwrap();
        let near = HazardReport::new("near", COLOMBO, Severity::Low);
        let far = HazardReport::new("far", Coordinate::new(80.6337, 7.2906), Severity::Low);
        let resolved = HazardReport::new("resolved", COLOMBO, Severity::Critical)
            .with_status(HazardStatus::Resolved);
        let inactive = HazardReport::new("inactive", COLOMBO, Severity::Critical).with_active(false);
        for hazard in [&near, &far, &resolved, &inactive] {
            upsert_hazard(db.pool(), hazard).await.unwrap();
        }

        let query = HazardQuery::new(COLOMBO, 5_000.0, 50);
        let found = query_nearby(db.pool(), &query).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[tokio::test]
    async fn list_filters_and_counts() {
        let db = init_database(":memory:", 1).await.unwrap();
        for (id, severity) in [("a", Severity::Low), ("b", Severity::High), ("c", Severity::High)] {
            upsert_hazard(db.pool(), &HazardReport::new(id, COLOMBO, severity))
                .await
                .unwrap();
        }
        deactivate_hazard(db.pool(), "c").await.unwrap();

        let filter = HazardFilter {
            severity: Some(Severity::High),
            ..HazardFilter::default()
        };
        let (page, total) = list_hazards(db.pool(), &filter, 10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, "b");

        let (_, total_all) = list_hazards(
            db.pool(),
            &HazardFilter {
                include_inactive: true,
                ..HazardFilter::default()
            },
            10,
            0,
        )
        .await
        .unwrap();
        assert_eq!(total_all, 3);
    }

    #[tokio::test]
    async fn unknown_type_and_bad_timestamp_fall_back() {
        let db = init_database(":memory:", 1).await.unwrap();
        upsert_hazard(db.pool(), &HazardReport::new("h1", COLOMBO, Severity::Medium))
            .await
            .unwrap();
        sqlx::query(
            "UPDATE hazards SET hazard_type = 'Sinkhole', created_at = 'yesterday' WHERE id = 'h1'",
        )
            .execute(db.pool())
            .await
            .unwrap();

        let before = Utc::now();
        let loaded = load_hazard(db.pool(), "h1").await.unwrap().unwrap();
        assert_eq!(loaded.hazard_type, HazardType::Other);
        assert!(loaded.created_at >= before);
        assert_eq!(loaded.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn unknown_severity_is_an_error() {
        let db = init_database(":memory:", 1).await.unwrap();
        upsert_hazard(db.pool(), &HazardReport::new("h1", COLOMBO, Severity::Medium))
            .await
            .unwrap();
        sqlx::query("UPDATE hazards SET severity = 'Extreme' WHERE id = 'h1'")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(load_hazard(db.pool(), "h1").await.is_err());
    }
}
