//! Router-wide middleware.

pub mod auth;
pub mod error_path;
