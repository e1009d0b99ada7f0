//! Middleware de Rate Limiting
//!
//! Contador keyed por IP con ventana TTL y evicción explícita de entradas
//! caducadas. Limitación conocida: el estado es por proceso, así que con
//! varias réplicas el límite efectivo se multiplica; si eso importa, el
//! contador debe moverse a un store compartido.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::environment::EnvironmentConfig;
use crate::utils::errors::AppError;

/// Información de rate limiting por clave
#[derive(Debug, Clone)]
struct RateLimitInfo {
    requests: u32,
    window_start: Instant,
}

/// Estado global del rate limiting
#[derive(Clone)]
pub struct RateLimitState {
    requests: Arc<RwLock<HashMap<String, RateLimitInfo>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimitState {
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: config.rate_limit_requests,
            window_duration: Duration::from_secs(config.rate_limit_window),
        }
    }

    /// Verificar si una clave ha excedido el límite de la ventana actual
    pub async fn check_rate_limit(&self, key: &str) -> Result<(), AppError> {
        let mut requests = self.requests.write().await;
        let now = Instant::now();

        // Evicción de ventanas caducadas
        requests.retain(|_, info| now.duration_since(info.window_start) < self.window_duration);

        let info = requests.entry(key.to_string()).or_insert(RateLimitInfo {
            requests: 0,
            window_start: now,
        });

        if now.duration_since(info.window_start) >= self.window_duration {
            info.requests = 1;
            info.window_start = now;
            return Ok(());
        }

        if info.requests >= self.max_requests {
            return Err(AppError::RateLimitExceeded);
        }

        info.requests += 1;
        Ok(())
    }
}

/// Middleware de rate limiting por IP del cliente
pub async fn rate_limit_middleware(
    State(rate_limit_state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .split(',')
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string();

    rate_limit_state.check_rate_limit(&ip).await?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max: u32, window_secs: u64) -> RateLimitState {
        RateLimitState {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests: max,
            window_duration: Duration::from_secs(window_secs),
        }
    }

    #[tokio::test]
    async fn test_allows_up_to_limit_then_rejects() {
        let limiter = state(3, 60);
        for _ in 0..3 {
            assert!(limiter.check_rate_limit("1.2.3.4").await.is_ok());
        }
        assert!(matches!(
            limiter.check_rate_limit("1.2.3.4").await,
            Err(AppError::RateLimitExceeded)
        ));
        // Otra IP no se ve afectada
        assert!(limiter.check_rate_limit("5.6.7.8").await.is_ok());
    }
}
