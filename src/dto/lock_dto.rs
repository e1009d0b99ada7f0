//! DTOs del soft-lock de coches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request para adquirir o liberar el lock. El session_id es un token
/// opaco generado por el cliente, nunca una identidad.
#[derive(Debug, Deserialize, Validate)]
pub struct LockRequest {
    #[validate(custom = "crate::utils::validation::validate_session_id")]
    pub session_id: String,
}

/// Response de lock adquirido
#[derive(Debug, Serialize)]
pub struct LockResponse {
    pub locked: bool,
    pub locked_until: DateTime<Utc>,
}

/// Response de lock liberado (idempotente)
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
}
