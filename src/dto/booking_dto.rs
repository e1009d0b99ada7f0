//! DTOs de reservas

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{Booking, LeadStatus};

/// Request para crear una reserva.
///
/// `total_price` es el precio que vio el cliente: solo se usa como tripwire
/// contra drift/fraude, nunca se persiste. `user_id` solo se honra si
/// coincide con el caller autenticado (o el caller es admin).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,

    #[validate(length(min = 2, max = 120))]
    pub customer_name: String,

    #[validate(custom = "crate::utils::validation::validate_phone")]
    pub customer_phone: String,

    #[validate(email)]
    pub customer_email: Option<String>,

    pub pickup_datetime: DateTime<Utc>,
    pub return_datetime: DateTime<Utc>,

    pub user_id: Option<Uuid>,

    /// Precio advisory del cliente
    pub total_price: Option<Decimal>,
}

/// Request para transicionar el estado del lead
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub to_status: LeadStatus,
    /// Obligatoria cuando un partner/admin cancela (es un rechazo)
    pub note: Option<String>,
}

/// Response de reserva para la API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_number: String,
    pub car_id: Uuid,
    pub partner_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub pickup_datetime: DateTime<Utc>,
    pub return_datetime: DateTime<Utc>,
    pub reserved_until: DateTime<Utc>,
    pub total_price: String,
    pub lead_status: LeadStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            booking_number: booking.booking_number,
            car_id: booking.car_id,
            partner_id: booking.partner_id,
            user_id: booking.user_id,
            customer_name: booking.customer_name,
            pickup_datetime: booking.pickup_datetime,
            return_datetime: booking.return_datetime,
            reserved_until: booking.reserved_until,
            total_price: booking.total_price.to_string(),
            lead_status: booking.lead_status,
            cancellation_reason: booking.cancellation_reason,
            created_at: booking.created_at,
        }
    }
}
