//! `/api/attendance` routes.
//!
//! | Method | Path                                | Who              |
//! |--------|-------------------------------------|------------------|
//! | POST   | `/check-in`                         | any participant  |
//! | POST   | `/qr/issue`                         | owner or admin   |
//! | POST   | `/qr/redeem`                        | any participant  |
//! | GET    | `/sessions/{session_id}/aggregate`  | owner or admin   |
//! | GET    | `/sessions/{session_id}/records`    | owner or admin   |
//!
//! Ownership is decided by the engine, so these routes only need a verified
//! caller.

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod common;
mod get;
mod post;

pub use get::{get_aggregate, list_records};
pub use post::{check_in, issue_qr, redeem_qr};

pub fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/check-in", post(check_in))
        .route("/qr/issue", post(issue_qr))
        .route("/qr/redeem", post(redeem_qr))
        .route("/sessions/{session_id}/aggregate", get(get_aggregate))
        .route("/sessions/{session_id}/records", get(list_records))
}
