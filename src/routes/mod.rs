//! HTTP routes
//!
//! The admin and user routers are merged into a single application
//! alongside the health endpoints.

pub mod admin;
pub mod health;
pub mod user;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build the full application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(admin::router())
        .merge(user::router())
        .with_state(state)
}
