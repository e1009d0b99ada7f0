//! Repository de User
//!
//! Solo lecturas: la comprobación de lista negra durante la creación de
//! reservas. El CRUD de usuarios vive fuera de este núcleo.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::user::User;
use crate::utils::errors::AppError;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Variante sobre la conexión de la transacción de creación
    pub async fn find_by_id_on(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(user)
    }
}
