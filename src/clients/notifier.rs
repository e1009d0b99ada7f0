//! Cliente de avisos a partners
//!
//! Entrega fire-and-forget: el POST al webhook del partner corre en un task
//! aparte y sus fallos solo se loguean. Un aviso caído JAMÁS revierte una
//! reserva ni una transición; la entrega fiable (Telegram/email/reintentos)
//! es responsabilidad de un sistema externo.

use reqwest::Client;
use serde_json::json;

use crate::models::booking::Booking;
use crate::models::partner::Partner;

#[derive(Clone)]
pub struct PartnerNotifier {
    http_client: Client,
}

impl PartnerNotifier {
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
        }
    }

    /// Aviso de reserva nueva al partner dueño del coche
    pub fn spawn_booking_created(&self, partner: &Partner, booking: &Booking) {
        let Some(url) = partner.webhook_url.clone() else {
            return;
        };
        let payload = json!({
            "event": "booking.created",
            "booking_number": booking.booking_number,
            "car_id": booking.car_id,
            "pickup_datetime": booking.pickup_datetime,
            "return_datetime": booking.return_datetime,
            "total_price": booking.total_price.to_string(),
        });
        self.spawn_post(url, payload);
    }

    /// Aviso de cierre del lead (completado o cancelado)
    pub fn spawn_status_changed(&self, partner: &Partner, booking: &Booking) {
        let Some(url) = partner.webhook_url.clone() else {
            return;
        };
        let payload = json!({
            "event": "booking.status_changed",
            "booking_number": booking.booking_number,
            "lead_status": booking.lead_status,
            "cancellation_reason": booking.cancellation_reason,
        });
        self.spawn_post(url, payload);
    }

    fn spawn_post(&self, url: String, payload: serde_json::Value) {
        let client = self.http_client.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("📨 Aviso entregado a {}", url);
                }
                Ok(resp) => {
                    tracing::warn!("⚠️ Webhook {} respondió {}", url, resp.status());
                }
                Err(e) => {
                    tracing::warn!("⚠️ Error enviando aviso a {}: {}", url, e);
                }
            }
        });
    }
}

impl Default for PartnerNotifier {
    fn default() -> Self {
        Self::new()
    }
}
