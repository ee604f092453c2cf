//! HTTP routes under `/api`.
//!
//! - `/health` → liveness probe (public)
//! - `/attendance` → check-in, QR issuance/redemption and session attendance
//!   (bearer token required)

use axum::{Router, middleware::from_fn};

use crate::auth::guards::allow_authenticated;
use crate::routes::{attendance::attendance_routes, health::health_routes};
use crate::state::AppState;

pub mod attendance;
pub mod common;
pub mod health;

/// Builds the `/api` router. Authentication is enforced per group so that
/// `/health` stays public.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest(
            "/attendance",
            attendance_routes().route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
