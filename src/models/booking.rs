//! Modelo de Booking y máquina de estados del lead
//!
//! Este módulo contiene el struct Booking y el enum LeadStatus con la tabla
//! de transiciones legales. La tabla vive en UN solo sitio
//! (`LeadStatus::can_transition_to`): los call sites nunca deciden por su
//! cuenta si un cambio de estado es válido.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del lead - mapea al ENUM lead_status
///
/// COMPLETED y CANCELLED son terminales: ninguna transición sale de ellos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Claimed,
    Pickup,
    Active,
    Return,
    Completed,
    Cancelled,
}

impl LeadStatus {
    /// Tabla de transiciones legales. Cualquier par no listado se rechaza.
    pub fn can_transition_to(self, to: LeadStatus) -> bool {
        use LeadStatus::*;
        matches!(
            (self, to),
            (New, Claimed)
                | (New, Cancelled)
                | (Claimed, Pickup)
                | (Claimed, Cancelled)
                | (Pickup, Active)
                | (Pickup, Cancelled)
                | (Active, Return)
                | (Return, Completed)
        )
    }

    /// Estados desde los que no se sale
    pub fn is_terminal(self) -> bool {
        matches!(self, LeadStatus::Completed | LeadStatus::Cancelled)
    }

    /// Nombre en minúsculas, igual que el ENUM de PostgreSQL
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Claimed => "claimed",
            LeadStatus::Pickup => "pickup",
            LeadStatus::Active => "active",
            LeadStatus::Return => "return",
            LeadStatus::Completed => "completed",
            LeadStatus::Cancelled => "cancelled",
        }
    }

    /// Todos los estados, para tests exhaustivos sobre la tabla
    pub fn all() -> [LeadStatus; 7] {
        [
            LeadStatus::New,
            LeadStatus::Claimed,
            LeadStatus::Pickup,
            LeadStatus::Active,
            LeadStatus::Return,
            LeadStatus::Completed,
            LeadStatus::Cancelled,
        ]
    }
}

/// Booking principal - mapea exactamente a la tabla bookings
///
/// Las reservas nunca se borran: los pares actor/timestamp por transición
/// forman la pista de auditoría del lead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub car_id: Uuid,
    /// Denormalizado desde el coche en el momento de la creación
    pub partner_id: Uuid,
    /// None para reservas de invitado
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pickup_datetime: DateTime<Utc>,
    pub return_datetime: DateTime<Utc>,
    /// Ventana corta de bloqueo tras la creación; informativa después
    pub reserved_until: DateTime<Utc>,
    /// Siempre calculado en servidor, nunca el valor del cliente
    pub total_price: Decimal,
    pub lead_status: LeadStatus,
    pub claimed_by_id: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub pickup_confirmed_by_id: Option<Uuid>,
    pub pickup_confirmed_at: Option<DateTime<Utc>>,
    pub return_confirmed_by_id: Option<Uuid>,
    pub return_confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_by_id: Option<Uuid>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Verificar si el hold de reserva sigue bloqueando nuevas creaciones
    pub fn hold_is_active(&self, now: DateTime<Utc>) -> bool {
        self.lead_status == LeadStatus::New && self.reserved_until > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LeadStatus::*;

    /// La tabla autoritativa, espejada aquí para verificar completitud:
    /// para cada estado S y cada destino V, la transición es legal si y
    /// solo si V aparece en la fila de S.
    fn allowed(from: LeadStatus) -> Vec<LeadStatus> {
        match from {
            New => vec![Claimed, Cancelled],
            Claimed => vec![Pickup, Cancelled],
            Pickup => vec![Active, Cancelled],
            Active => vec![Return],
            Return => vec![Completed],
            Completed | Cancelled => vec![],
        }
    }

    #[test]
    fn test_transition_table_completeness() {
        for from in LeadStatus::all() {
            let row = allowed(from);
            for to in LeadStatus::all() {
                assert_eq!(
                    from.can_transition_to(to),
                    row.contains(&to),
                    "transición {:?} -> {:?} no coincide con la tabla",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in LeadStatus::all() {
            assert!(!Completed.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!New.is_terminal());
        assert!(!Return.is_terminal());
    }

    #[test]
    fn test_new_cannot_jump_to_pickup() {
        // Escenario literal del contrato: NEW solo va a CLAIMED o CANCELLED
        assert!(!New.can_transition_to(Pickup));
        assert!(!New.can_transition_to(Active));
        assert!(!New.can_transition_to(Completed));
    }

    #[test]
    fn test_as_str_matches_postgres_enum() {
        assert_eq!(New.as_str(), "new");
        assert_eq!(Return.as_str(), "return");
        assert_eq!(Cancelled.as_str(), "cancelled");
    }
}
