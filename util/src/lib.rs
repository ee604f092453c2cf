//! Shared runtime utilities for the attendance backend.

pub mod config;
