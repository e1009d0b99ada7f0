//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del núcleo de reservas
//! y su conversión a respuestas HTTP apropiadas. Ningún error de este
//! núcleo se traga silenciosamente: todos llegan al caller con kind + mensaje.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Car locked by another session, retry in {remaining_minutes} minutes")]
    LockConflict { remaining_minutes: i64 },

    #[error("Car has an active reservation hold")]
    ReservationHeld,

    #[error("Requested dates overlap an existing booking")]
    DateOverlap,

    #[error("Submitted price {submitted} differs from calculated price {calculated} beyond tolerance")]
    PriceMismatch {
        submitted: Decimal,
        calculated: Decimal,
    },

    #[error("Car not available: {0}")]
    NotAvailable(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Código de error estable para clientes de la API
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "VALIDATION_ERROR",
            AppError::LockConflict { .. } => "LOCK_CONFLICT",
            AppError::ReservationHeld => "RESERVATION_HELD",
            AppError::DateOverlap => "DATE_OVERLAP",
            AppError::PriceMismatch { .. } => "PRICE_MISMATCH",
            AppError::NotAvailable(_) => "CAR_NOT_AVAILABLE",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Jwt(_) => "JWT_ERROR",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Status HTTP correspondiente al error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::PriceMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::LockConflict { .. }
            | AppError::ReservationHeld
            | AppError::DateOverlap
            | AppError::NotAvailable(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let details = match &self {
            AppError::Database(e) => {
                eprintln!("Database error: {}", e);
                Some(json!({ "sql_error": e.to_string() }))
            }
            AppError::Validation(e) => Some(json!(e)),
            AppError::LockConflict { remaining_minutes } => {
                Some(json!({ "remaining_minutes": remaining_minutes }))
            }
            AppError::PriceMismatch {
                submitted,
                calculated,
            } => Some(json!({
                "submitted_price": submitted.to_string(),
                "calculated_price": calculated.to_string(),
            })),
            AppError::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            AppError::Internal(msg) => {
                eprintln!("Internal error: {}", msg);
                None
            }
            _ => None,
        };

        let error_response = ErrorResponse {
            error: code.clone(),
            message: self.to_string(),
            details,
            code,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_taxonomy() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::LockConflict {
                remaining_minutes: 3
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ReservationHeld.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::DateOverlap.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::NotAvailable("pending approval".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Forbidden("blacklisted".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: "new".into(),
                to: "pickup".into()
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::NotFound("booking".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_price_mismatch_is_bad_request() {
        let err = AppError::PriceMismatch {
            submitted: Decimal::new(5000, 0),
            calculated: Decimal::new(3000, 0),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "PRICE_MISMATCH");
    }

    #[test]
    fn test_not_found_helper() {
        let err = not_found_error("Car", "abc");
        assert!(err.to_string().contains("Car with id 'abc' not found"));
    }
}
