//! Route record (evaluation history) persistence operations.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use hazard_core::{Place, RouteAlternative, RouteKind, RouteRecord};
use sqlx::SqlitePool;
use tracing::warn;

const RECORD_COLUMNS: &str =
    "id, owner_id, origin, destination, routes, selected_route, is_active, created_at";

/// Insert a new route record.
pub async fn insert_route_record(pool: &SqlitePool, record: &RouteRecord) -> Result<()> {
    let origin_json = serde_json::to_string(&record.origin)?;
    let destination_json = serde_json::to_string(&record.destination)?;
    let routes_json = serde_json::to_string(&record.routes)?;

    sqlx::query(
        r#"
        INSERT INTO route_records (
            id, owner_id, origin, destination, routes,
            selected_route, is_active, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&record.id)
    .bind(&record.owner_id)
    .bind(&origin_json)
    .bind(&destination_json)
    .bind(&routes_json)
    .bind(record.selected_route.as_str())
    .bind(record.is_active)
    .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a single active route record by ID.
pub async fn load_route_record(pool: &SqlitePool, id: &str) -> Result<Option<RouteRecord>> {
    let row = sqlx::query_as::<_, RouteRecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM route_records WHERE id = ?1 AND is_active = 1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(RouteRecord::try_from).transpose()
}

/// Active records newest first, optionally for one owner. Returns the page and the total.
pub async fn load_history(
    pool: &SqlitePool,
    owner_id: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<(Vec<RouteRecord>, u64)> {
    let rows = sqlx::query_as::<_, RouteRecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM route_records \
         WHERE is_active = 1 AND (?1 IS NULL OR owner_id = ?1) \
         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
    ))
    .bind(owner_id)
    .bind(i64::from(limit))
    .bind(i64::from(offset))
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM route_records WHERE is_active = 1 AND (?1 IS NULL OR owner_id = ?1)",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    let records = rows
        .into_iter()
        .map(RouteRecord::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok((records, total.max(0) as u64))
}

/// Every active record, optionally for one owner.
pub async fn load_active_records(
    pool: &SqlitePool,
    owner_id: Option<&str>,
) -> Result<Vec<RouteRecord>> {
    let rows = sqlx::query_as::<_, RouteRecordRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM route_records \
         WHERE is_active = 1 AND (?1 IS NULL OR owner_id = ?1)"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
}

/// Change the selected alternative. Returns false if no active record matched.
pub async fn update_selected_route(pool: &SqlitePool, id: &str, kind: RouteKind) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE route_records SET selected_route = ?2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?1 AND is_active = 1",
    )
    .bind(id)
    .bind(kind.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-delete a record. Returns false if no active record matched.
pub async fn deactivate_route_record(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE route_records SET is_active = 0, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?1 AND is_active = 1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct RouteRecordRow {
    id: String,
    owner_id: Option<String>,
    origin: String,
    destination: String,
    routes: String,
    selected_route: String,
    is_active: bool,
    created_at: String,
}

impl TryFrom<RouteRecordRow> for RouteRecord {
    type Error = anyhow::Error;

    fn try_from(row: RouteRecordRow) -> Result<Self> {
        let origin: Place = serde_json::from_str(&row.origin)?;
        let destination: Place = serde_json::from_str(&row.destination)?;
        let routes: Vec<RouteAlternative> = serde_json::from_str(&row.routes)?;
        let selected_route = RouteKind::parse(&row.selected_route).unwrap_or_else(|| {
            warn!(
                "Unknown selected route '{}' on record {}, using safest",
                row.selected_route, row.id
            );
            RouteKind::default()
        });

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|err| {
                warn!(
                    "Unparseable created_at '{}' on record {}: {}",
                    row.created_at, row.id, err
                );
                Utc::now()
            });

        Ok(RouteRecord {
            id: row.id,
            owner_id: row.owner_id,
            origin,
            destination,
            routes,
            selected_route,
            is_active: row.is_active,
            created_at,
        })
    }
}
