//! Controller de reservas

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::booking_dto::{BookingResponse, CreateBookingRequest, TransitionRequest};
use crate::dto::common::ApiResponse;
use crate::models::auth::AuthContext;
use crate::services::booking_service::BookingService;
use crate::services::lead_status_service::LeadStatusService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct BookingController {
    bookings: BookingService,
    lead_status: LeadStatusService,
}

impl BookingController {
    pub fn new(state: &AppState) -> Self {
        Self {
            bookings: BookingService::new(
                state.pool.clone(),
                state.notifier.clone(),
                state.config.reservation_hold_minutes,
                state.config.price_tolerance_percent,
            ),
            lead_status: LeadStatusService::new(state.pool.clone(), state.notifier.clone()),
        }
    }

    pub async fn create(
        &self,
        auth: &AuthContext,
        request: CreateBookingRequest,
    ) -> Result<ApiResponse<BookingResponse>, AppError> {
        request.validate()?;

        let booking = self.bookings.create(auth, request, Utc::now()).await?;

        Ok(ApiResponse::success_with_message(
            booking.into(),
            "Reserva creada exitosamente".to_string(),
        ))
    }

    pub async fn transition(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
        request: TransitionRequest,
    ) -> Result<ApiResponse<BookingResponse>, AppError> {
        let booking = self
            .lead_status
            .transition(auth, booking_id, request.to_status, request.note, Utc::now())
            .await?;

        Ok(ApiResponse::success(booking.into()))
    }

    pub async fn get_by_id(
        &self,
        auth: &AuthContext,
        booking_id: Uuid,
    ) -> Result<BookingResponse, AppError> {
        let booking = self.bookings.get_by_id(auth, booking_id).await?;
        Ok(booking.into())
    }
}
