//! Creación de reservas
//!
//! Valida y persiste una reserva nueva como operación todo-o-nada. Los pasos
//! 3-9 del contrato (coche, hold, solapamiento, blacklist, precio, insert)
//! corren dentro de UNA transacción que abre bloqueando el row del coche con
//! FOR UPDATE: dos creadores concurrentes para el mismo coche se serializan
//! ahí y nunca pasan los dos el chequeo de solapamiento.
//!
//! El precio del cliente es solo un tripwire anti-fraude: se persiste SIEMPRE
//! el precio calculado en servidor.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::clients::notifier::PartnerNotifier;
use crate::dto::booking_dto::CreateBookingRequest;
use crate::models::auth::AuthContext;
use crate::models::booking::Booking;
use crate::repositories::booking_repository::{BookingRepository, NewBooking};
use crate::repositories::car_repository::CarRepository;
use crate::repositories::partner_repository::PartnerRepository;
use crate::repositories::user_repository::UserRepository;
use crate::utils::booking_number;
use crate::utils::errors::AppError;

/// Reintentos de insert ante colisión del booking_number
const MAX_NUMBER_RETRIES: usize = 3;

/// Días facturables: los días parciales se redondean hacia arriba.
/// Presupone pickup < return (validado antes).
pub fn ceil_days(pickup: DateTime<Utc>, return_dt: DateTime<Utc>) -> i64 {
    let secs = (return_dt - pickup).num_seconds();
    (secs + 86_399) / 86_400
}

/// Precio de servidor: ceil(días) × precio por día
pub fn calculate_total_price(
    pickup: DateTime<Utc>,
    return_dt: DateTime<Utc>,
    price_per_day: Decimal,
) -> Decimal {
    Decimal::from(ceil_days(pickup, return_dt)) * price_per_day
}

/// ¿El precio del cliente cae dentro de la banda de tolerancia?
/// |client - calculated| <= calculated × tolerance / 100.
/// La banda del ±10% es una heurística heredada, configurable: no es una
/// frontera de seguridad, el valor persistido es siempre el calculado.
pub fn within_tolerance(client: Decimal, calculated: Decimal, tolerance_percent: Decimal) -> bool {
    (client - calculated).abs() * Decimal::new(100, 0) <= calculated * tolerance_percent
}

/// Resolver el user_id de la reserva contra la identidad del caller.
/// Un user_id ajeno enviado por un no-admin se descarta en silencio (la
/// reserva pasa a invitado), nunca se rechaza el request por esto.
pub fn resolve_user_id(auth: &AuthContext, requested: Option<Uuid>) -> Option<Uuid> {
    match requested {
        Some(uid) if auth.is_admin() || auth.user_id == Some(uid) => Some(uid),
        Some(_) => None,
        None => auth.user_id,
    }
}

fn is_booking_number_collision(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.constraint() == Some("bookings_booking_number_key")
    )
}

pub struct BookingService {
    pool: PgPool,
    partners: PartnerRepository,
    notifier: PartnerNotifier,
    hold_minutes: i64,
    tolerance_percent: Decimal,
}

impl BookingService {
    pub fn new(
        pool: PgPool,
        notifier: PartnerNotifier,
        hold_minutes: i64,
        tolerance_percent: Decimal,
    ) -> Self {
        Self {
            partners: PartnerRepository::new(pool.clone()),
            pool,
            notifier,
            hold_minutes,
            tolerance_percent,
        }
    }

    /// Crear una reserva. Secuencia de validación del contrato; cada fallo
    /// corta con su error propio.
    pub async fn create(
        &self,
        auth: &AuthContext,
        request: CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        // 1. Rango de fechas: return estrictamente posterior a pickup
        if request.pickup_datetime >= request.return_datetime {
            return Err(AppError::BadRequest(
                "return_datetime debe ser posterior a pickup_datetime".to_string(),
            ));
        }

        // 2. user_id solo si coincide con el caller (o caller admin)
        let user_id = resolve_user_id(auth, request.user_id);

        let mut tx = self.pool.begin().await?;

        // 3. Cargar coche bajo row lock; aprobado y disponible
        let car = CarRepository::find_by_id_for_update(&mut *tx, request.car_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Car '{}' not found", request.car_id)))?;

        if !car.is_bookable() {
            return Err(AppError::NotAvailable(format!(
                "approval={:?}, rental={:?}",
                car.approval_status, car.rental_status
            )));
        }

        // 4. Hold activo: reserva NEW con reserved_until en el futuro
        if BookingRepository::has_active_hold(&mut *tx, car.id, now).await? {
            return Err(AppError::ReservationHeld);
        }

        // 5. Solapamiento contra reservas no terminales
        if BookingRepository::has_overlap(
            &mut *tx,
            car.id,
            request.pickup_datetime,
            request.return_datetime,
            None,
        )
        .await?
        {
            return Err(AppError::DateOverlap);
        }

        // 6. Lista negra del usuario resuelto
        if let Some(uid) = user_id {
            let user = UserRepository::find_by_id_on(&mut *tx, uid)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", uid)))?;
            if user.is_blacklisted {
                return Err(AppError::Forbidden(
                    "Usuario en lista negra".to_string(),
                ));
            }
        }

        // 7. Precio de servidor; el del cliente solo se contrasta
        let calculated = calculate_total_price(
            request.pickup_datetime,
            request.return_datetime,
            car.price_per_day,
        );
        if let Some(client_price) = request.total_price {
            if !within_tolerance(client_price, calculated, self.tolerance_percent) {
                return Err(AppError::PriceMismatch {
                    submitted: client_price,
                    calculated,
                });
            }
        }

        // 8-9. Insert con número único; reintento acotado sobre colisión
        let mut new_booking = NewBooking {
            booking_number: booking_number::generate(now),
            car_id: car.id,
            partner_id: car.partner_id,
            user_id,
            customer_name: request.customer_name,
            customer_phone: request.customer_phone,
            customer_email: request.customer_email,
            pickup_datetime: request.pickup_datetime,
            return_datetime: request.return_datetime,
            reserved_until: now + Duration::minutes(self.hold_minutes),
            total_price: calculated,
        };

        let mut booking = None;
        for attempt in 0..MAX_NUMBER_RETRIES {
            match BookingRepository::insert(&mut *tx, &new_booking, now).await {
                Ok(created) => {
                    booking = Some(created);
                    break;
                }
                Err(e) if is_booking_number_collision(&e) && attempt + 1 < MAX_NUMBER_RETRIES => {
                    tracing::warn!(
                        "⚠️ Colisión de booking_number '{}', regenerando",
                        new_booking.booking_number
                    );
                    new_booking.booking_number = booking_number::generate(now);
                }
                Err(e) => return Err(e.into()),
            }
        }
        let booking = booking.ok_or_else(|| {
            AppError::Internal("No se pudo generar un booking_number único".to_string())
        })?;

        tx.commit().await?;

        tracing::info!(
            "📝 Reserva creada: {} car={} total={}",
            booking.booking_number,
            booking.car_id,
            booking.total_price
        );

        // 10. Aviso al partner: fire-and-forget, un fallo jamás revierte la reserva
        if let Ok(Some(partner)) = self.partners.find_by_id(booking.partner_id).await {
            self.notifier.spawn_booking_created(&partner, &booking);
        }

        Ok(booking)
    }

    /// Lectura con autorización: admin, staff del partner dueño, o el propio
    /// cliente de la reserva.
    pub async fn get_by_id(&self, auth: &AuthContext, id: Uuid) -> Result<Booking, AppError> {
        let booking = BookingRepository::new(self.pool.clone())
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", id)))?;

        let is_owner = booking.user_id.is_some() && booking.user_id == auth.user_id;
        if auth.is_admin() || auth.is_staff_of(booking.partner_id) || is_owner {
            Ok(booking)
        } else {
            Err(AppError::Forbidden(
                "No tienes permiso para ver esta reserva".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use chrono::TimeZone;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_ceil_days_whole_days() {
        // Escenario literal del contrato: 3 días exactos
        assert_eq!(ceil_days(dt(2025, 3, 1, 10), dt(2025, 3, 4, 10)), 3);
    }

    #[test]
    fn test_ceil_days_rounds_partial_up() {
        // 2 días y 1 hora -> 3 días facturables
        assert_eq!(ceil_days(dt(2025, 3, 1, 10), dt(2025, 3, 3, 11)), 3);
        // 1 hora -> 1 día
        assert_eq!(ceil_days(dt(2025, 3, 1, 10), dt(2025, 3, 1, 11)), 1);
    }

    #[test]
    fn test_total_price_scenario() {
        // pricePerDay = 1000, 3 días -> 3000
        let total = calculate_total_price(
            dt(2025, 3, 1, 10),
            dt(2025, 3, 4, 10),
            Decimal::new(1000, 0),
        );
        assert_eq!(total, Decimal::new(3000, 0));
    }

    #[test]
    fn test_tolerance_band() {
        let calc = Decimal::new(3000, 0);
        let tol = Decimal::new(10, 0);

        assert!(within_tolerance(Decimal::new(3000, 0), calc, tol));
        // Exactamente en el borde del ±10%
        assert!(within_tolerance(Decimal::new(3300, 0), calc, tol));
        assert!(within_tolerance(Decimal::new(2700, 0), calc, tol));
        // Fuera de banda
        assert!(!within_tolerance(Decimal::new(3301, 0), calc, tol));
        assert!(!within_tolerance(Decimal::new(2699, 0), calc, tol));
    }

    #[test]
    fn test_resolve_user_id_matching_caller() {
        let uid = Uuid::new_v4();
        let auth = AuthContext {
            user_id: Some(uid),
            role: UserRole::Customer,
            partner_id: None,
        };
        assert_eq!(resolve_user_id(&auth, Some(uid)), Some(uid));
        // Sin user_id explícito, la reserva queda asociada al caller
        assert_eq!(resolve_user_id(&auth, None), Some(uid));
    }

    #[test]
    fn test_resolve_user_id_mismatch_becomes_guest() {
        let auth = AuthContext {
            user_id: Some(Uuid::new_v4()),
            role: UserRole::Customer,
            partner_id: None,
        };
        // user_id ajeno de un no-admin: se descarta, no se rechaza
        assert_eq!(resolve_user_id(&auth, Some(Uuid::new_v4())), None);
    }

    #[test]
    fn test_resolve_user_id_admin_can_book_for_anyone() {
        let target = Uuid::new_v4();
        let auth = AuthContext {
            user_id: Some(Uuid::new_v4()),
            role: UserRole::Admin,
            partner_id: None,
        };
        assert_eq!(resolve_user_id(&auth, Some(target)), Some(target));
    }

    #[test]
    fn test_resolve_user_id_anonymous_is_guest() {
        let auth = AuthContext::anonymous();
        assert_eq!(resolve_user_id(&auth, None), None);
        assert_eq!(resolve_user_id(&auth, Some(Uuid::new_v4())), None);
    }
}
