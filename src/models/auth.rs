//! Contexto de identidad
//!
//! La verificación de credenciales es una capability externa: este núcleo
//! recibe una identidad ya resuelta (o anónima) y decide autorización sobre
//! ella. Nunca valida passwords ni gestiona sesiones.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Rol del actor - mapea al ENUM user_role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Partner,
    Admin,
}

/// Identidad resuelta del request
///
/// `user_id = None` significa caller anónimo (las reservas de invitado
/// son legales; las transiciones de estado no).
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Option<Uuid>,
    pub role: UserRole,
    pub partner_id: Option<Uuid>,
}

impl AuthContext {
    /// Contexto para requests sin token
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            role: UserRole::Customer,
            partner_id: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Verificar si el actor es staff del partner dado
    pub fn is_staff_of(&self, partner_id: Uuid) -> bool {
        self.role == UserRole::Partner && self.partner_id == Some(partner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_context() {
        let auth = AuthContext::anonymous();
        assert!(auth.user_id.is_none());
        assert!(!auth.is_admin());
        assert!(!auth.is_staff_of(Uuid::new_v4()));
    }

    #[test]
    fn test_is_staff_of_requires_matching_partner() {
        let partner_id = Uuid::new_v4();
        let auth = AuthContext {
            user_id: Some(Uuid::new_v4()),
            role: UserRole::Partner,
            partner_id: Some(partner_id),
        };
        assert!(auth.is_staff_of(partner_id));
        assert!(!auth.is_staff_of(Uuid::new_v4()));
    }
}
