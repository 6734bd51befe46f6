//! API routes for the hazard route server.

pub mod hazards;
pub mod request_id;
pub mod route_plans;
mod routes;

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub fn routes() -> axum::Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn validation_error(message: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Validation failed",
            "message": message.to_string()
        })),
    )
}

/// Unwrap a JSON body, reporting malformed or incomplete bodies as validation failures.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| validation_error(rejection.body_text()))
}

pub(crate) fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("{what} not found") })),
    )
}

pub(crate) fn internal_error(context: &str, err: anyhow::Error) -> ApiError {
    tracing::error!("{}: {:#}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": context })),
    )
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl PageQuery {
    /// Resolved (limit, page, offset) with `default_limit` and a 1-based page.
    pub fn resolve(&self, default_limit: u32) -> (u32, u32, u32) {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (limit, page, (page - 1).saturating_mul(limit))
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub pages: u64,
    pub limit: u32,
}

impl Pagination {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        Self {
            total,
            page,
            pages: total.div_ceil(u64::from(limit)),
            limit,
        }
    }
}
