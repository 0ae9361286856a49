//! Column typing, statistics and chart projection for spreadsheet data.
//!
//! The engine in [`services`] is pure and synchronous: hand it a
//! [`models::Dataset`] and it returns a [`models::StatisticsArtifact`] or
//! chart points. [`routes`] exposes the same operations over HTTP.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::{analyzer::SheetAnalyzer, charts::ChartProjector};

/// Shared by every handler; the engine itself keeps no per-request state.
pub struct AppState {
    pub config: config::Config,
    pub analyzer: SheetAnalyzer,
    pub projector: ChartProjector,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        let projector = ChartProjector::new(config.charts.clone());
        Self {
            config,
            analyzer: SheetAnalyzer,
            projector,
        }
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .merge(routes::routes())
        .merge(routes::sheets::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
