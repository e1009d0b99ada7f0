//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y los tunables del
//! núcleo de reservas (TTLs y banda de tolerancia de precio).

use rust_decimal::Decimal;
use std::env;

use crate::utils::clock::{DEFAULT_LOCK_TTL_MINUTES, DEFAULT_RESERVATION_HOLD_MINUTES};

/// Tolerancia por defecto entre el precio del cliente y el calculado (%).
/// Heurística heredada del sistema original: tunable, no frontera de seguridad.
pub const DEFAULT_PRICE_TOLERANCE_PERCENT: i64 = 10;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,
    /// TTL del soft-lock de coche (minutos)
    pub lock_ttl_minutes: i64,
    /// TTL del hold de reserva tras crear un booking (minutos)
    pub reservation_hold_minutes: i64,
    /// Banda de tolerancia del precio del cliente (%)
    pub price_tolerance_percent: Decimal,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("RATE_LIMIT_REQUESTS must be a valid number"),
            rate_limit_window: env::var("RATE_LIMIT_WINDOW")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("RATE_LIMIT_WINDOW must be a valid number"),
            lock_ttl_minutes: env::var("LOCK_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOCK_TTL_MINUTES),
            reservation_hold_minutes: env::var("RESERVATION_HOLD_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RESERVATION_HOLD_MINUTES),
            price_tolerance_percent: env::var("PRICE_TOLERANCE_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| Decimal::new(DEFAULT_PRICE_TOLERANCE_PERCENT, 0)),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
