//! Repository de CommissionLog
//!
//! Append-only: solo insert y lecturas. No existe update ni delete en este
//! núcleo; el payout se marca fuera de banda por el tooling externo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::commission::CommissionLog;
use crate::utils::errors::AppError;

pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insertar la fila de comisión dentro de la transacción de la
    /// transición a COMPLETED. El UNIQUE sobre booking_id es el cinturón
    /// contra el double-charge si algo reintenta por fuera del CAS.
    pub async fn insert(
        conn: &mut PgConnection,
        partner_id: Uuid,
        booking_id: Uuid,
        booking_amount: Decimal,
        commission_rate: Decimal,
        commission_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<CommissionLog, AppError> {
        let log = sqlx::query_as::<_, CommissionLog>(
            r#"
            INSERT INTO commission_logs (
                id, partner_id, booking_id, booking_amount,
                commission_rate, commission_amount, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(partner_id)
        .bind(booking_id)
        .bind(booking_amount)
        .bind(commission_rate)
        .bind(commission_amount)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok(log)
    }

    pub async fn find_by_booking(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<CommissionLog>, AppError> {
        let log = sqlx::query_as::<_, CommissionLog>(
            "SELECT * FROM commission_logs WHERE booking_id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(log)
    }

    pub async fn list_by_partner(&self, partner_id: Uuid) -> Result<Vec<CommissionLog>, AppError> {
        let logs = sqlx::query_as::<_, CommissionLog>(
            "SELECT * FROM commission_logs WHERE partner_id = $1 ORDER BY created_at DESC",
        )
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
