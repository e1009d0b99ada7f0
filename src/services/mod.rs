//! Servicios del núcleo de reservas
//!
//! Orquestan validación, transacciones y efectos sobre los repositories.

pub mod booking_service;
pub mod lead_status_service;
pub mod lock_service;
