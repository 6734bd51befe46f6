//! Shared library surface for the hazard route server and its tests.

pub mod api;
pub mod config;
pub mod hazard_query;
pub mod persistence;
pub mod state;
