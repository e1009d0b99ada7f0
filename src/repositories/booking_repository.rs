//! Repository de Booking
//!
//! Contiene el validador de solapamiento (la garantía autoritativa contra el
//! double-booking) y los updates CAS de la máquina de estados. Cada update de
//! estado re-valida el estado "from" en el propio WHERE: si una transición
//! concurrente ganó, el statement afecta 0 filas y el caller lo detecta.
//!
//! El chequeo de solapamiento y el insert viajan SIEMPRE por la misma
//! conexión/transacción, con el row del coche ya bloqueado FOR UPDATE.
//! Un SELECT suelto seguido de INSERT en otro round trip es el anti-patrón
//! que este módulo existe para impedir.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::booking::{Booking, LeadStatus};
use crate::utils::errors::AppError;

/// Predicado de solapamiento de intervalos semiabiertos [p1, r1) y [p2, r2):
/// p1 < r2 AND p2 < r1. Tocarse en el borde (r1 == p2) no es solapar.
pub fn intervals_overlap(
    p1: DateTime<Utc>,
    r1: DateTime<Utc>,
    p2: DateTime<Utc>,
    r2: DateTime<Utc>,
) -> bool {
    p1 < r2 && p2 < r1
}

/// Datos de inserción de una reserva nueva
#[derive(Debug)]
pub struct NewBooking {
    pub booking_number: String,
    pub car_id: Uuid,
    pub partner_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pickup_datetime: DateTime<Utc>,
    pub return_datetime: DateTime<Utc>,
    pub reserved_until: DateTime<Utc>,
    pub total_price: Decimal,
}

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Cargar la reserva tomando su row lock: linealiza las transiciones
    /// concurrentes sobre el mismo booking.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(booking)
    }

    /// ¿Existe una reserva no terminal del coche que solape [pickup, return)?
    pub async fn has_overlap(
        conn: &mut PgConnection,
        car_id: Uuid,
        pickup: DateTime<Utc>,
        return_dt: DateTime<Utc>,
        exclude_booking_id: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE car_id = $1
                  AND lead_status NOT IN ('completed', 'cancelled')
                  AND ($4::uuid IS NULL OR id <> $4)
                  AND pickup_datetime < $3
                  AND $2 < return_datetime
            )
            "#,
        )
        .bind(car_id)
        .bind(pickup)
        .bind(return_dt)
        .bind(exclude_booking_id)
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }

    /// ¿Hay un hold activo sobre el coche? (reserva NEW con reserved_until
    /// todavía en el futuro). Guarda corta contra submits casi simultáneos.
    pub async fn has_active_hold(
        conn: &mut PgConnection,
        car_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE car_id = $1
                  AND lead_status = 'new'
                  AND reserved_until > $2
            )
            "#,
        )
        .bind(car_id)
        .bind(now)
        .fetch_one(conn)
        .await?;

        Ok(exists)
    }

    /// Insertar la reserva con lead_status = NEW. Devuelve sqlx::Error crudo
    /// para que el caller distinga la unique violation del booking_number
    /// y reintente con otro sufijo.
    pub async fn insert(
        conn: &mut PgConnection,
        new_booking: &NewBooking,
        now: DateTime<Utc>,
    ) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id, booking_number, car_id, partner_id, user_id,
                customer_name, customer_phone, customer_email,
                pickup_datetime, return_datetime, reserved_until,
                total_price, lead_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'new', $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_booking.booking_number)
        .bind(new_booking.car_id)
        .bind(new_booking.partner_id)
        .bind(new_booking.user_id)
        .bind(&new_booking.customer_name)
        .bind(&new_booking.customer_phone)
        .bind(&new_booking.customer_email)
        .bind(new_booking.pickup_datetime)
        .bind(new_booking.return_datetime)
        .bind(new_booking.reserved_until)
        .bind(new_booking.total_price)
        .bind(now)
        .fetch_one(conn)
        .await
    }

    /// NEW -> CLAIMED, registrando claimed_by/claimed_at
    pub async fn claim(
        conn: &mut PgConnection,
        id: Uuid,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET lead_status = 'claimed', claimed_by_id = $2, claimed_at = $3
            WHERE id = $1 AND lead_status = 'new'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(now)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    /// CLAIMED -> PICKUP, registrando pickup_confirmed_by/at
    pub async fn confirm_pickup(
        conn: &mut PgConnection,
        id: Uuid,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET lead_status = 'pickup', pickup_confirmed_by_id = $2, pickup_confirmed_at = $3
            WHERE id = $1 AND lead_status = 'claimed'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(now)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    /// PICKUP -> ACTIVE (sin sello de actor: el coche ya está en la calle)
    pub async fn activate(conn: &mut PgConnection, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET lead_status = 'active'
            WHERE id = $1 AND lead_status = 'pickup'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    /// ACTIVE -> RETURN, registrando return_confirmed_by/at
    pub async fn confirm_return(
        conn: &mut PgConnection,
        id: Uuid,
        actor_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET lead_status = 'return', return_confirmed_by_id = $2, return_confirmed_at = $3
            WHERE id = $1 AND lead_status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actor_id)
        .bind(now)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    /// RETURN -> COMPLETED. El estado terminal es la garantía de idempotencia
    /// de la comisión: un segundo complete afecta 0 filas.
    pub async fn complete(conn: &mut PgConnection, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET lead_status = 'completed'
            WHERE id = $1 AND lead_status = 'return'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }

    /// * -> CANCELLED desde el estado `from` concreto que leímos bajo lock
    pub async fn cancel(
        conn: &mut PgConnection,
        id: Uuid,
        from: LeadStatus,
        actor_id: Option<Uuid>,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET lead_status = 'cancelled',
                cancelled_by_id = $3,
                cancelled_at = $4,
                cancellation_reason = $5
            WHERE id = $1 AND lead_status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(actor_id)
        .bind(now)
        .bind(reason)
        .fetch_optional(conn)
        .await?;

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_overlap_partial() {
        // [1,4) contra [3,5): comparten el día 3
        assert!(intervals_overlap(dt(1, 10), dt(4, 10), dt(3, 10), dt(5, 10)));
        assert!(intervals_overlap(dt(3, 10), dt(5, 10), dt(1, 10), dt(4, 10)));
    }

    #[test]
    fn test_overlap_containment() {
        assert!(intervals_overlap(dt(1, 10), dt(10, 10), dt(3, 10), dt(5, 10)));
        assert!(intervals_overlap(dt(3, 10), dt(5, 10), dt(1, 10), dt(10, 10)));
    }

    #[test]
    fn test_touching_boundary_does_not_overlap() {
        // return de la primera == pickup de la segunda: intervalos
        // semiabiertos, back-to-back es legal
        assert!(!intervals_overlap(dt(1, 10), dt(4, 10), dt(4, 10), dt(6, 10)));
        assert!(!intervals_overlap(dt(4, 10), dt(6, 10), dt(1, 10), dt(4, 10)));
    }

    #[test]
    fn test_disjoint_ranges() {
        assert!(!intervals_overlap(dt(1, 10), dt(2, 10), dt(5, 10), dt(6, 10)));
    }

    #[test]
    fn test_identical_ranges_overlap() {
        assert!(intervals_overlap(dt(1, 10), dt(4, 10), dt(1, 10), dt(4, 10)));
    }
}
