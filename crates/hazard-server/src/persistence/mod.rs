//! Persistence layer for the hazard route server.
//!
//! Provides SQLite-backed storage for hazard reports and evaluated route records.
//! Hazards are also cached in memory (see `state`) for the degraded lookup path.

pub mod db;
pub mod hazards;
pub mod route_records;

pub use db::{init_database, Database};
