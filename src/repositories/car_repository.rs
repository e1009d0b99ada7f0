//! Repository de Car
//!
//! Todas las operaciones de exclusión sobre el coche se expresan como
//! statements condicionales únicos (compare-and-swap en el UPDATE) o como
//! row locks `FOR UPDATE` dentro de una transacción. Nunca como un par
//! read-then-write desde la aplicación: con varias réplicas eso es una race.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::car::Car;
use crate::utils::errors::AppError;

pub struct CarRepository {
    pool: PgPool,
}

impl CarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, AppError> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    /// Cargar el coche tomando su row lock. Punto de serialización por coche
    /// para la creación de reservas: dos creadores concurrentes sobre el
    /// mismo coche se ordenan aquí.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Car>, AppError> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(car)
    }

    /// Intento CAS de adquirir el soft-lock. El predicado admite tres casos
    /// en un solo statement: coche sin lock, lock expirado, o refresh
    /// idempotente de la misma sesión. Devuelve las filas afectadas:
    /// 0 significa coche inexistente o lock vigente de otra sesión.
    pub async fn try_acquire_lock(
        &self,
        car_id: Uuid,
        session_id: &str,
        locked_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE cars
            SET locked_until = $3, locked_by_session = $2
            WHERE id = $1
              AND (locked_until IS NULL OR locked_until <= $4 OR locked_by_session = $2)
            "#,
        )
        .bind(car_id)
        .bind(session_id)
        .bind(locked_until)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Liberación CAS del soft-lock: solo limpia si la sesión es la titular.
    /// 0 filas significa coche inexistente, ya liberado, o titular distinto.
    pub async fn clear_lock(&self, car_id: Uuid, session_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE cars
            SET locked_until = NULL, locked_by_session = NULL
            WHERE id = $1 AND locked_by_session = $2
            "#,
        )
        .bind(car_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Devolver el coche a AVAILABLE si ya no le queda ninguna reserva en
    /// estado no terminal. Solo deshace el flip a RENTED: un coche puesto a
    /// mano en MAINTENANCE se queda así. El recuento y el SET van en el mismo
    /// statement, dentro de la transacción de la transición, para que una
    /// creación concurrente no se cruce con el check.
    pub async fn release_if_idle(conn: &mut PgConnection, car_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE cars
            SET rental_status = 'available'
            WHERE id = $1
              AND rental_status = 'rented'
              AND NOT EXISTS (
                  SELECT 1 FROM bookings
                  WHERE car_id = $1
                    AND lead_status NOT IN ('completed', 'cancelled')
              )
            "#,
        )
        .bind(car_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
