//! Generación de números de reserva
//!
//! Formato: `JR-YYYYMMDD-<6 hex>`. El sufijo aleatorio hace la colisión
//! despreciable; aun así el insert reintenta sobre la unique violation
//! porque la unicidad la garantiza el índice, no la probabilidad.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Prefijo de producto de los números de reserva
pub const BOOKING_NUMBER_PREFIX: &str = "JR";

/// Generar un número de reserva con la fecha del día y sufijo hex aleatorio
pub fn generate(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!(
        "{}-{}-{:06x}",
        BOOKING_NUMBER_PREFIX,
        now.format("%Y%m%d"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_date_coded_with_hex_suffix() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let number = generate(now);

        assert!(number.starts_with("JR-20250301-"));
        assert_eq!(number.len(), "JR-20250301-".len() + 6);

        let suffix = &number["JR-20250301-".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_consecutive_numbers_differ() {
        let now = Utc::now();
        // No es una prueba de unicidad (eso lo da el índice), solo de que
        // el sufijo realmente varía.
        let a = generate(now);
        let b = generate(now);
        let c = generate(now);
        assert!(a != b || b != c);
    }
}
