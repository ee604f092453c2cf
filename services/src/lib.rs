//! Attendance verification and session engine.
//!
//! [`CheckInOrchestrator`] is the entry point. It is wired from explicit
//! collaborators: an [`AttendanceStore`] for durable state, an
//! [`EphemeralStore`] for QR tokens and rollups, the two verifier adapters
//! and a [`Clock`].

pub mod aggregate;
pub mod cache;
pub mod checkin;
pub mod clock;
pub mod config;
pub mod error;
pub mod policy;
pub mod qr;
pub mod store;
pub mod verifier;

pub use aggregate::{AggregateCache, SessionAggregate};
pub use cache::{DatabaseCache, EphemeralStore, MemoryCache};
pub use checkin::{Actor, CheckInOrchestrator, CheckInRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{AttendanceError, AttendanceResult};
pub use qr::{QrSession, QrSessionManager};
pub use store::{AttendanceStore, InMemoryStore, InsertOutcome, NewAttendance, SeaOrmStore};
