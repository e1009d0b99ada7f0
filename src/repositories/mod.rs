//! Repositories del sistema
//!
//! Acceso a datos con SQLx. Toda la exclusión (locks, solapamientos,
//! transiciones) se expresa como SQL condicional atómico en esta capa.

pub mod booking_repository;
pub mod car_repository;
pub mod commission_repository;
pub mod partner_repository;
pub mod user_repository;
