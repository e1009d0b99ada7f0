//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! de entrada: identificadores de sesión, teléfonos de contacto y
//! rangos de fechas.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Teléfono internacional laxo: dígitos, espacios, guiones, paréntesis,
    /// prefijo + opcional. Entre 7 y 20 caracteres útiles.
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 ()\-]{5,18}[0-9]$").unwrap();
}

/// Longitud mínima del session id del soft-lock (token opaco del cliente)
pub const MIN_SESSION_ID_LEN: usize = 10;

/// Validar el token de sesión del soft-lock. Es una capability opaca,
/// no una identidad: solo exigimos longitud mínima.
pub fn validate_session_id(value: &str) -> Result<(), ValidationError> {
    if value.trim().len() < MIN_SESSION_ID_LEN {
        let mut error = ValidationError::new("session_id");
        error.add_param("min_length".into(), &MIN_SESSION_ID_LEN);
        return Err(error);
    }
    Ok(())
}

/// Validar teléfono de contacto del cliente
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(value.trim()) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar que el rango de fechas sea estrictamente pickup < return
pub fn validate_date_range(
    pickup: DateTime<Utc>,
    return_dt: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if pickup >= return_dt {
        let mut error = ValidationError::new("date_range");
        error.add_param("pickup".into(), &pickup.to_rfc3339());
        error.add_param("return".into(), &return_dt.to_rfc3339());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_id_minimum_length() {
        assert!(validate_session_id("short").is_err());
        assert!(validate_session_id("123456789").is_err());
        assert!(validate_session_id("1234567890").is_ok());
        assert!(validate_session_id("  padded-but-short ").is_err());
        assert!(validate_session_id("browser-session-abcdef").is_ok());
    }

    #[test]
    fn test_phone_formats() {
        assert!(validate_phone("+34 612 345 678").is_ok());
        assert!(validate_phone("612345678").is_ok());
        assert!(validate_phone("(212) 555-0134").is_ok());
        assert!(validate_phone("abc").is_err());
        assert!(validate_phone("12").is_err());
    }

    #[test]
    fn test_date_range_strict_order() {
        let now = Utc::now();
        assert!(validate_date_range(now, now + Duration::days(1)).is_ok());
        assert!(validate_date_range(now, now).is_err());
        assert!(validate_date_range(now + Duration::days(1), now).is_err());
    }
}
