//! Extractor de identidad
//!
//! Convierte el header Authorization (si existe) en un `AuthContext`.
//! Sin token el request sigue adelante como anónimo: las reservas de
//! invitado son un caso soportado. Un token presente pero inválido sí se
//! rechaza con 401.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::models::auth::AuthContext;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(AuthContext::anonymous());
        };

        let value = header
            .to_str()
            .map_err(|_| AppError::Jwt("Header Authorization ilegible".to_string()))?;

        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Jwt("Se esperaba esquema Bearer".to_string()))?;

        verify_token(token, &state.config.jwt_secret)
    }
}
