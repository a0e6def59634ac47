//! Sales Dashboard API Library
//!
//! Order intake with atomic inventory reservation, per-day sales and
//! revenue rollups kept consistent with the order ledger, and best-effort
//! change notification for dashboard subscribers.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub order_service: services::orders::OrderService,
    pub inventory_service: services::inventory::InventoryService,
    pub report_service: services::reports::RevenueReportService,
}

/// Uniform response envelope for successful requests.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// The versioned API surface: order intake and queries, inventory reads
/// plus restock, and the rollup projections.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", handlers::orders::routes())
        .nest("/inventory", handlers::inventory::routes())
        .nest("/revenues", handlers::reports::revenue_routes())
        .route(
            "/sales-performances",
            get(handlers::reports::list_sales_performances),
        )
}
