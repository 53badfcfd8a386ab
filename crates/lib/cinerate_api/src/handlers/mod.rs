//! HTTP request handlers.

pub mod auth;
pub mod health;
pub mod movies;
pub mod ratings;
pub mod registration;
