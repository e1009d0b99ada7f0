//! Máquina de estados del lead
//!
//! Única puerta de entrada para mover una reserva por su ciclo de vida.
//! La legalidad la decide la tabla de `LeadStatus::can_transition_to`; la
//! escritura es un CAS sobre el estado "from" leído bajo row lock, así dos
//! transiciones concurrentes incompatibles nunca aciertan las dos.
//!
//! Efectos por transición (atómicos con el cambio de estado):
//!   -> CLAIMED / PICKUP / RETURN: sello actor/timestamp
//!   -> COMPLETED: una (y solo una) fila de comisión
//!   -> CANCELLED: motivo de cancelación
//!   -> terminal: el coche vuelve a AVAILABLE si no le quedan reservas vivas

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::clients::notifier::PartnerNotifier;
use crate::models::auth::AuthContext;
use crate::models::booking::{Booking, LeadStatus};
use crate::models::commission::CommissionLog;
use crate::repositories::booking_repository::BookingRepository;
use crate::repositories::car_repository::CarRepository;
use crate::repositories::commission_repository::CommissionRepository;
use crate::repositories::partner_repository::PartnerRepository;
use crate::utils::errors::AppError;

/// Autorización de la transición, separada de la legalidad de la tabla.
///
/// Avances (CLAIMED/PICKUP/ACTIVE/RETURN/COMPLETED): solo staff del partner
/// dueño o admin. CANCELLED: el propio cliente de la reserva (solo desde NEW
/// o CLAIMED), el partner dueño o un admin.
pub fn authorize_transition(
    auth: &AuthContext,
    booking_partner_id: Uuid,
    booking_user_id: Option<Uuid>,
    from: LeadStatus,
    to: LeadStatus,
) -> Result<(), AppError> {
    if auth.is_admin() || auth.is_staff_of(booking_partner_id) {
        return Ok(());
    }

    if to == LeadStatus::Cancelled {
        let is_owner = booking_user_id.is_some() && booking_user_id == auth.user_id;
        let cancellable_by_customer = matches!(from, LeadStatus::New | LeadStatus::Claimed);
        if is_owner && cancellable_by_customer {
            return Ok(());
        }
        return Err(AppError::Forbidden(
            "Solo el cliente de la reserva (desde NEW o CLAIMED), el partner o un admin pueden cancelar".to_string(),
        ));
    }

    Err(AppError::Forbidden(
        "Solo el staff del partner dueño o un admin pueden avanzar el lead".to_string(),
    ))
}

/// La cancelación iniciada por partner/admin es un rechazo y exige motivo.
/// Para el auto-cancel del cliente el motivo es opcional.
pub fn validate_cancellation_note(
    auth: &AuthContext,
    booking_partner_id: Uuid,
    note: Option<&str>,
) -> Result<(), AppError> {
    let is_rejection = auth.is_admin() || auth.is_staff_of(booking_partner_id);
    if is_rejection && note.map_or(true, |n| n.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "La cancelación por partner/admin requiere un motivo".to_string(),
        ));
    }
    Ok(())
}

pub struct LeadStatusService {
    pool: PgPool,
    partners: PartnerRepository,
    notifier: PartnerNotifier,
}

impl LeadStatusService {
    pub fn new(pool: PgPool, notifier: PartnerNotifier) -> Self {
        Self {
            partners: PartnerRepository::new(pool.clone()),
            pool,
            notifier,
        }
    }

    /// Ejecutar una transición con sus efectos, todo en una transacción.
    pub async fn transition(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
        to: LeadStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let booking = BookingRepository::find_by_id_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking '{}' not found", booking_id)))?;

        let from = booking.lead_status;
        if !from.can_transition_to(to) {
            return Err(AppError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        authorize_transition(auth, booking.partner_id, booking.user_id, from, to)?;

        let updated = match to {
            LeadStatus::Claimed => {
                let actor = required_actor(auth)?;
                BookingRepository::claim(&mut *tx, booking_id, actor, now).await?
            }
            LeadStatus::Pickup => {
                let actor = required_actor(auth)?;
                BookingRepository::confirm_pickup(&mut *tx, booking_id, actor, now).await?
            }
            LeadStatus::Active => BookingRepository::activate(&mut *tx, booking_id).await?,
            LeadStatus::Return => {
                let actor = required_actor(auth)?;
                BookingRepository::confirm_return(&mut *tx, booking_id, actor, now).await?
            }
            LeadStatus::Completed => BookingRepository::complete(&mut *tx, booking_id).await?,
            LeadStatus::Cancelled => {
                validate_cancellation_note(auth, booking.partner_id, note.as_deref())?;
                BookingRepository::cancel(
                    &mut *tx,
                    booking_id,
                    from,
                    auth.user_id,
                    note.as_deref(),
                    now,
                )
                .await?
            }
            // La tabla no admite volver a NEW; inalcanzable tras el check
            LeadStatus::New => None,
        };

        // 0 filas en el CAS: una transición concurrente ganó la carrera
        let updated = updated.ok_or_else(|| AppError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })?;

        if to == LeadStatus::Completed {
            let partner = PartnerRepository::find_by_id_on(&mut *tx, updated.partner_id)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(format!(
                        "Partner '{}' de la reserva no existe",
                        updated.partner_id
                    ))
                })?;

            let amount = CommissionLog::amount_for(updated.total_price, partner.commission_rate);
            CommissionRepository::insert(
                &mut *tx,
                partner.id,
                updated.id,
                updated.total_price,
                partner.commission_rate,
                amount,
                now,
            )
            .await?;

            tracing::info!(
                "💰 Comisión registrada: booking={} amount={} rate={}%",
                updated.booking_number,
                amount,
                partner.commission_rate
            );
        }

        if to.is_terminal() {
            let released = CarRepository::release_if_idle(&mut *tx, updated.car_id).await?;
            if released {
                tracing::info!("🚗 Coche {} devuelto a AVAILABLE", updated.car_id);
            }
        }

        tx.commit().await?;

        tracing::info!(
            "➡️ Transición {}: {} -> {}",
            updated.booking_number,
            from.as_str(),
            to.as_str()
        );

        // Aviso best-effort al partner en estados terminales
        if to.is_terminal() {
            if let Ok(Some(partner)) = self.partners.find_by_id(updated.partner_id).await {
                self.notifier.spawn_status_changed(&partner, &updated);
            }
        }

        Ok(updated)
    }
}

/// Las transiciones con sello de actor exigen identidad concreta
fn required_actor(auth: &AuthContext) -> Result<Uuid, AppError> {
    auth.user_id
        .ok_or_else(|| AppError::Forbidden("Se requiere identidad para esta acción".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use LeadStatus::*;

    fn customer(uid: Uuid) -> AuthContext {
        AuthContext {
            user_id: Some(uid),
            role: UserRole::Customer,
            partner_id: None,
        }
    }

    fn staff(partner_id: Uuid) -> AuthContext {
        AuthContext {
            user_id: Some(Uuid::new_v4()),
            role: UserRole::Partner,
            partner_id: Some(partner_id),
        }
    }

    fn admin() -> AuthContext {
        AuthContext {
            user_id: Some(Uuid::new_v4()),
            role: UserRole::Admin,
            partner_id: None,
        }
    }

    #[test]
    fn test_forward_moves_require_owning_partner_or_admin() {
        let partner_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        for to in [Claimed, Pickup, Active, Return, Completed] {
            assert!(authorize_transition(&staff(partner_id), partner_id, Some(user_id), New, to).is_ok());
            assert!(authorize_transition(&admin(), partner_id, Some(user_id), New, to).is_ok());
            // Staff de OTRO partner: prohibido
            assert!(
                authorize_transition(&staff(Uuid::new_v4()), partner_id, Some(user_id), New, to)
                    .is_err()
            );
            // El cliente no avanza el lead
            assert!(
                authorize_transition(&customer(user_id), partner_id, Some(user_id), New, to)
                    .is_err()
            );
        }
    }

    #[test]
    fn test_customer_cancels_only_from_new_or_claimed() {
        let partner_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let auth = customer(user_id);

        assert!(authorize_transition(&auth, partner_id, Some(user_id), New, Cancelled).is_ok());
        assert!(authorize_transition(&auth, partner_id, Some(user_id), Claimed, Cancelled).is_ok());
        assert!(authorize_transition(&auth, partner_id, Some(user_id), Pickup, Cancelled).is_err());
    }

    #[test]
    fn test_other_customer_cannot_cancel() {
        let partner_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let stranger = customer(Uuid::new_v4());

        assert!(authorize_transition(&stranger, partner_id, Some(owner), New, Cancelled).is_err());
        // Reserva de invitado: ningún customer puede cancelarla
        assert!(
            authorize_transition(&customer(Uuid::new_v4()), partner_id, None, New, Cancelled)
                .is_err()
        );
    }

    #[test]
    fn test_anonymous_cannot_transition() {
        let partner_id = Uuid::new_v4();
        let auth = AuthContext::anonymous();
        assert!(authorize_transition(&auth, partner_id, None, New, Claimed).is_err());
        assert!(authorize_transition(&auth, partner_id, None, New, Cancelled).is_err());
    }

    #[test]
    fn test_partner_cancellation_requires_note() {
        let partner_id = Uuid::new_v4();

        assert!(validate_cancellation_note(&staff(partner_id), partner_id, None).is_err());
        assert!(validate_cancellation_note(&staff(partner_id), partner_id, Some("  ")).is_err());
        assert!(
            validate_cancellation_note(&staff(partner_id), partner_id, Some("sin stock")).is_ok()
        );
        assert!(validate_cancellation_note(&admin(), partner_id, None).is_err());
    }

    #[test]
    fn test_customer_cancellation_note_is_optional() {
        let partner_id = Uuid::new_v4();
        let auth = customer(Uuid::new_v4());
        assert!(validate_cancellation_note(&auth, partner_id, None).is_ok());
        assert!(validate_cancellation_note(&auth, partner_id, Some("cambio de planes")).is_ok());
    }
}
