use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

pub mod sheets;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
