//! Modelo de CommissionLog
//!
//! Registro append-only de comisiones: se escribe exactamente una vez por
//! reserva completada y nunca se actualiza ni se borra desde este núcleo.
//! El estado de pago lo lleva un ledger externo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// CommissionLog - mapea exactamente a la tabla commission_logs
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommissionLog {
    pub id: Uuid,
    pub partner_id: Uuid,
    /// UNIQUE en el schema: 1:1 con una reserva COMPLETED
    pub booking_id: Uuid,
    pub booking_amount: Decimal,
    /// Porcentaje, snapshot de la tarifa del partner al completar
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl CommissionLog {
    /// commission_amount = booking_amount × commission_rate / 100
    pub fn amount_for(booking_amount: Decimal, commission_rate: Decimal) -> Decimal {
        booking_amount * commission_rate / Decimal::new(100, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commission_amount_is_percentage_of_booking() {
        // 3000 al 15% -> 450
        let amount = CommissionLog::amount_for(Decimal::new(3000, 0), Decimal::new(15, 0));
        assert_eq!(amount, Decimal::new(450, 0));
    }

    #[test]
    fn test_commission_amount_with_fractional_rate() {
        // 1000 al 12.5% -> 125
        let amount = CommissionLog::amount_for(Decimal::new(1000, 0), Decimal::new(125, 1));
        assert_eq!(amount, Decimal::new(125, 0));
    }

    #[test]
    fn test_commission_amount_zero_rate() {
        let amount = CommissionLog::amount_for(Decimal::new(3000, 0), Decimal::ZERO);
        assert_eq!(amount, Decimal::ZERO);
    }
}
