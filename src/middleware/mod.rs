//! Middleware del servidor

pub mod auth;
pub mod cors;
pub mod rate_limit;
