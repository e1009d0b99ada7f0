//! Utilidades JWT
//!
//! Este módulo solo decodifica tokens ya emitidos por la capa de auth
//! externa y los convierte en un `AuthContext`. La emisión de tokens y el
//! ciclo de vida de sesiones no viven en este núcleo.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::auth::{AuthContext, UserRole};
use crate::utils::errors::AppError;

/// Claims del JWT token
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// user_id
    pub sub: String,
    pub role: UserRole,
    pub partner_id: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Verificar y decodificar un JWT, devolviendo el contexto de identidad
pub fn verify_token(token: &str, secret: &str) -> Result<AuthContext, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());

    let token_data = decode::<JwtClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AppError::Jwt(format!("Token inválido: {}", e)))?;

    let claims = token_data.claims;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Jwt("Claim 'sub' no es un UUID".to_string()))?;

    let partner_id = match claims.partner_id.as_deref() {
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| AppError::Jwt("Claim 'partner_id' no es un UUID".to_string()))?,
        ),
        None => None,
    };

    Ok(AuthContext {
        user_id: Some(user_id),
        role: claims.role,
        partner_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(claims: &JwtClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_partner_claims() {
        let user_id = Uuid::new_v4();
        let partner_id = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = JwtClaims {
            sub: user_id.to_string(),
            role: UserRole::Partner,
            partner_id: Some(partner_id.to_string()),
            exp: now + 3600,
            iat: now,
        };

        let token = make_token(&claims, "test-secret");
        let auth = verify_token(&token, "test-secret").unwrap();

        assert_eq!(auth.user_id, Some(user_id));
        assert_eq!(auth.role, UserRole::Partner);
        assert_eq!(auth.partner_id, Some(partner_id));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = JwtClaims {
            sub: Uuid::new_v4().to_string(),
            role: UserRole::Customer,
            partner_id: None,
            exp: now + 3600,
            iat: now,
        };

        let token = make_token(&claims, "secret-a");
        assert!(matches!(
            verify_token(&token, "secret-b"),
            Err(AppError::Jwt(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = JwtClaims {
            sub: Uuid::new_v4().to_string(),
            role: UserRole::Customer,
            partner_id: None,
            exp: now - 120,
            iat: now - 3600,
        };

        let token = make_token(&claims, "test-secret");
        assert!(verify_token(&token, "test-secret").is_err());
    }
}
