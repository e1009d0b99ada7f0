//! Modelo de User
//!
//! Este núcleo solo consulta usuarios para dos cosas: asociar una reserva a
//! una identidad verificada y comprobar la lista negra. El registro, login
//! y edición de perfiles viven fuera.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::auth::UserRole;

/// User - mapea exactamente a la tabla users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    /// Solo para staff de partner
    pub partner_id: Option<Uuid>,
    pub is_blacklisted: bool,
    pub created_at: DateTime<Utc>,
}
