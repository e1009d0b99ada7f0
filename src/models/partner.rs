//! Modelo de Partner
//!
//! El partner es la empresa de alquiler dueña de los coches. Su CRUD es
//! responsabilidad de otra capa; este núcleo solo lee la tarifa de comisión
//! vigente y el destino de notificaciones.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Partner - mapea exactamente a la tabla partners
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    /// Porcentaje de comisión vigente; se snapshotea al completar cada reserva
    pub commission_rate: Decimal,
    /// Webhook opcional para avisos de reservas (entrega best-effort, fuera del núcleo)
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
