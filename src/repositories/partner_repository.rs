//! Repository de Partner
//!
//! Lecturas únicamente: la tarifa de comisión vigente y el webhook de avisos.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::partner::Partner;
use crate::utils::errors::AppError;

pub struct PartnerRepository {
    pool: PgPool,
}

impl PartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Partner>, AppError> {
        let partner = sqlx::query_as::<_, Partner>("SELECT * FROM partners WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(partner)
    }

    /// Variante sobre la conexión de una transacción: la tarifa se lee en la
    /// misma transacción que escribe la comisión, para snapshotearla junto
    /// al cambio de estado.
    pub async fn find_by_id_on(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Partner>, AppError> {
        let partner = sqlx::query_as::<_, Partner>("SELECT * FROM partners WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(partner)
    }
}
