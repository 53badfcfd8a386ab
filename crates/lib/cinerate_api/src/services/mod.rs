//! Business logic behind the HTTP handlers.

pub mod auth;
pub mod catalog;
