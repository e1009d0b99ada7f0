//! Rutas de la API

pub mod booking_routes;
pub mod lock_routes;
