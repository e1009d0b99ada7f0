//! Modelo de Car
//!
//! Este módulo contiene el struct Car y sus enums de estado.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.
//!
//! Los campos de soft-lock (`locked_until`, `locked_by_session`) son
//! advisory: sirven para que la UI muestre "coche ocupado" mientras otro
//! cliente rellena el formulario. La exclusión autoritativa contra el
//! double-booking es el chequeo de solapamiento al crear la reserva.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de aprobación del coche - mapea al ENUM approval_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Estado de alquiler del coche - mapea al ENUM rental_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "rental_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Available,
    Rented,
    Maintenance,
}

/// Car principal - mapea exactamente a la tabla cars
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub price_per_day: Decimal,
    pub approval_status: ApprovalStatus,
    pub rental_status: RentalStatus,
    pub locked_until: Option<DateTime<Utc>>,
    pub locked_by_session: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Car {
    /// Un coche es reservable solo si está aprobado y disponible
    pub fn is_bookable(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
            && self.rental_status == RentalStatus::Available
    }

    /// Verificar si el soft-lock sigue vigente en el instante dado
    pub fn lock_is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    /// Verificar si la sesión dada es la titular del lock
    pub fn locked_by(&self, session_id: &str) -> bool {
        self.locked_by_session.as_deref() == Some(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_car() -> Car {
        Car {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            price_per_day: Decimal::new(1000, 0),
            approval_status: ApprovalStatus::Approved,
            rental_status: RentalStatus::Available,
            locked_until: None,
            locked_by_session: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_bookable_requires_approved_and_available() {
        let mut car = sample_car();
        assert!(car.is_bookable());

        car.approval_status = ApprovalStatus::Pending;
        assert!(!car.is_bookable());

        car.approval_status = ApprovalStatus::Approved;
        car.rental_status = RentalStatus::Maintenance;
        assert!(!car.is_bookable());

        car.rental_status = RentalStatus::Rented;
        assert!(!car.is_bookable());
    }

    #[test]
    fn test_lock_is_active_only_before_expiry() {
        let now = Utc::now();
        let mut car = sample_car();
        assert!(!car.lock_is_active(now));

        car.locked_until = Some(now + Duration::minutes(5));
        car.locked_by_session = Some("session-abc-123".to_string());
        assert!(car.lock_is_active(now));
        assert!(car.locked_by("session-abc-123"));
        assert!(!car.locked_by("otra-sesion-999"));

        // Lock expirado: deja de estar activo aunque los campos sigan escritos
        car.locked_until = Some(now - Duration::seconds(1));
        assert!(!car.lock_is_active(now));
    }
}
