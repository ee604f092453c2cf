//! HTTP surface of the attendance engine.

pub mod auth;
pub mod response;
pub mod routes;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower_http::cors::CorsLayer;

use crate::auth::middleware::log_request;
use crate::routes::routes;
use crate::state::AppState;

/// The full application: `/api` routes, request logging and CORS.
///
/// `log_request` needs `ConnectInfo`, so serve it with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", routes(app_state))
        .layer(from_fn(log_request))
        .layer(CorsLayer::very_permissive())
}
