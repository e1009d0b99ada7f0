//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! JWT, tiempo/TTL y generación de números de reserva.

pub mod booking_number;
pub mod clock;
pub mod errors;
pub mod jwt;
pub mod validation;
