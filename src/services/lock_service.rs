//! Soft-lock de coches
//!
//! Reclamo exclusivo y con TTL sobre un coche mientras un cliente rellena el
//! formulario multi-paso. Es una señal de UX ("coche ocupado, reintenta en N
//! minutos"), no la garantía de corrección: esa la da el validador de
//! solapamiento al crear la reserva, que nunca confía en este lock.
//!
//! El caller (capa UI) adquiere al cargar la página y refresca con heartbeat
//! (~30s); este servicio solo garantiza que la primitiva es race-free.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::car::Car;
use crate::repositories::car_repository::CarRepository;
use crate::utils::clock;
use crate::utils::errors::AppError;
use crate::utils::validation::validate_session_id;

/// Resultado de una adquisición exitosa
#[derive(Debug, Clone, Copy)]
pub struct LockGrant {
    pub locked_until: DateTime<Utc>,
}

/// Por qué falló un CAS de adquisición, según el re-read del coche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireFailure {
    /// Lock vigente de otra sesión: conflicto real, sin nada que reintentar
    Held { remaining_minutes: i64 },
    /// El lock expiró entre nuestro `now` y el del statement: reintentable
    Expired,
}

/// Clasificar un CAS de adquisición que afectó 0 filas. El re-read decide:
/// lock todavía vigente es conflicto (con minutos restantes, nunca 0 para no
/// decir "retry in 0 minutes"); cualquier otra cosa es una race de expiración.
pub fn classify_acquire_failure(car: &Car, now: DateTime<Utc>) -> AcquireFailure {
    if car.lock_is_active(now) {
        let until = car.locked_until.unwrap_or(now);
        AcquireFailure::Held {
            remaining_minutes: clock::remaining_minutes(until, now).max(1),
        }
    } else {
        AcquireFailure::Expired
    }
}

/// Clasificar un clear CAS que afectó 0 filas. Lock ya libre o expirado es un
/// no-op exitoso (double-release y release tardío son legales); un lock
/// vigente de otra sesión es el único caso que se rechaza.
pub fn classify_release_failure(car: &Car, now: DateTime<Utc>) -> Result<(), AppError> {
    if car.lock_is_active(now) {
        return Err(AppError::Forbidden(
            "El lock pertenece a otra sesión".to_string(),
        ));
    }
    Ok(())
}

pub struct LockService {
    cars: CarRepository,
    ttl_minutes: i64,
}

impl LockService {
    pub fn new(pool: PgPool, ttl_minutes: i64) -> Self {
        Self {
            cars: CarRepository::new(pool),
            ttl_minutes,
        }
    }

    /// Adquirir (o refrescar idempotentemente) el soft-lock del coche.
    ///
    /// El CAS del repository resuelve en un solo statement los tres casos
    /// legales. Si falla porque el lock expiró entre nuestro `now` y el del
    /// statement, se reintenta exactamente UNA vez con un `now` fresco: las
    /// races de expiración son esperadas y deben autocurarse, no dar error.
    /// Es el único reintento silencioso de todo el núcleo.
    pub async fn acquire(
        &self,
        car_id: Uuid,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LockGrant, AppError> {
        validate_session_id(session_id)
            .map_err(|_| AppError::BadRequest("session_id demasiado corto".to_string()))?;

        let mut now = now;
        for attempt in 0..2 {
            let locked_until = now + Duration::minutes(self.ttl_minutes);
            let rows = self
                .cars
                .try_acquire_lock(car_id, session_id, locked_until, now)
                .await?;

            if rows > 0 {
                tracing::debug!(
                    "🔒 Lock adquirido: car={} session={} hasta {}",
                    car_id,
                    session_id,
                    locked_until
                );
                return Ok(LockGrant { locked_until });
            }

            let car = self
                .cars
                .find_by_id(car_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Car '{}' not found", car_id)))?;

            now = Utc::now();
            match classify_acquire_failure(&car, now) {
                AcquireFailure::Held { remaining_minutes } => {
                    return Err(AppError::LockConflict { remaining_minutes });
                }
                AcquireFailure::Expired => {
                    // Segundo intento con now fresco
                    if attempt == 0 {
                        tracing::debug!(
                            "🔁 Lock de car={} expirado en carrera, reintentando",
                            car_id
                        );
                    }
                }
            }
        }

        // Dos CAS fallidos seguidos sin lock vigente: alguien lo está
        // readquiriendo en caliente. Tratarlo como conflicto corto.
        Err(AppError::LockConflict {
            remaining_minutes: 1,
        })
    }

    /// Liberar el lock. Idempotente: double-release y release tardío (lock
    /// ya expirado) son éxitos silenciosos. Solo falla si otra sesión tiene
    /// el lock vigente.
    pub async fn release(&self, car_id: Uuid, session_id: &str) -> Result<(), AppError> {
        validate_session_id(session_id)
            .map_err(|_| AppError::BadRequest("session_id demasiado corto".to_string()))?;

        let rows = self.cars.clear_lock(car_id, session_id).await?;
        if rows > 0 {
            return Ok(());
        }

        let car = self
            .cars
            .find_by_id(car_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Car '{}' not found", car_id)))?;

        classify_release_failure(&car, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::car::{ApprovalStatus, RentalStatus};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn car_with_lock(locked_until: Option<DateTime<Utc>>, session: Option<&str>) -> Car {
        Car {
            id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            price_per_day: Decimal::new(1000, 0),
            approval_status: ApprovalStatus::Approved,
            rental_status: RentalStatus::Available,
            locked_until,
            locked_by_session: session.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_live_foreign_lock_is_conflict_with_ceiled_minutes() {
        let now = Utc::now();
        let car = car_with_lock(
            Some(now + Duration::minutes(4) + Duration::seconds(30)),
            Some("otra-sesion-xyz"),
        );

        assert_eq!(
            classify_acquire_failure(&car, now),
            AcquireFailure::Held {
                remaining_minutes: 5
            }
        );
    }

    #[test]
    fn test_conflict_never_reports_zero_minutes() {
        let now = Utc::now();
        // A segundos de expirar: el mensaje debe decir 1, nunca 0
        let car = car_with_lock(Some(now + Duration::seconds(10)), Some("otra-sesion-xyz"));

        assert_eq!(
            classify_acquire_failure(&car, now),
            AcquireFailure::Held {
                remaining_minutes: 1
            }
        );
    }

    #[test]
    fn test_expired_lock_is_retryable() {
        let now = Utc::now();
        let car = car_with_lock(Some(now - Duration::seconds(1)), Some("otra-sesion-xyz"));
        assert_eq!(classify_acquire_failure(&car, now), AcquireFailure::Expired);

        // Deadline exactamente en now: expirado, no vigente
        let car = car_with_lock(Some(now), Some("otra-sesion-xyz"));
        assert_eq!(classify_acquire_failure(&car, now), AcquireFailure::Expired);
    }

    #[test]
    fn test_unlocked_car_after_failed_cas_is_retryable() {
        // CAS fallido pero el coche ya no tiene lock: readquisición en
        // caliente por otra sesión; se clasifica como expirado y se reintenta
        let now = Utc::now();
        let car = car_with_lock(None, None);
        assert_eq!(classify_acquire_failure(&car, now), AcquireFailure::Expired);
    }

    #[test]
    fn test_release_is_silent_on_free_or_expired_lock() {
        let now = Utc::now();

        // Sin lock: double-release legal
        let car = car_with_lock(None, None);
        assert!(classify_release_failure(&car, now).is_ok());

        // Lock expirado con campos todavía escritos: release tardío legal
        let car = car_with_lock(Some(now - Duration::minutes(1)), Some("otra-sesion-xyz"));
        assert!(classify_release_failure(&car, now).is_ok());
    }

    #[test]
    fn test_release_rejects_foreign_live_lock() {
        let now = Utc::now();
        let car = car_with_lock(Some(now + Duration::minutes(3)), Some("otra-sesion-xyz"));

        assert!(matches!(
            classify_release_failure(&car, now),
            Err(AppError::Forbidden(_))
        ));
    }
}
