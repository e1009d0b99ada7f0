//! Utilidades de tiempo y TTL
//!
//! Helpers para comparar expiraciones y calcular el tiempo restante de un
//! lock o de un hold. Todos los cálculos trabajan sobre `DateTime<Utc>`.

use chrono::{DateTime, Utc};

/// TTL del soft-lock de coche (minutos) si no se configura otro valor
pub const DEFAULT_LOCK_TTL_MINUTES: i64 = 5;

/// TTL del hold de reserva tras crear un booking (minutos)
pub const DEFAULT_RESERVATION_HOLD_MINUTES: i64 = 15;

/// Verificar si un deadline opcional ya pasó. `None` cuenta como expirado.
pub fn is_expired(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match deadline {
        Some(until) => until <= now,
        None => true,
    }
}

/// Minutos restantes hasta el deadline, redondeando hacia arriba.
/// Nunca devuelve menos de 1 para un deadline todavía futuro, para que el
/// mensaje "retry in N minutes" no diga nunca 0.
pub fn remaining_minutes(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (deadline - now).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + 59) / 60
}
