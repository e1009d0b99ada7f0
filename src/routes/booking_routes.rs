//! Rutas de reservas

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{BookingResponse, CreateBookingRequest, TransitionRequest};
use crate::dto::common::ApiResponse;
use crate::models::auth::AuthContext;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/:id", get(get_booking))
        .route("/:id/status", patch(transition_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingResponse>>), AppError> {
    let controller = BookingController::new(&state);
    let response = controller.create(&auth, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_booking(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.get_by_id(&auth, id).await?;
    Ok(Json(response))
}

async fn transition_booking(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<BookingResponse>>, AppError> {
    let controller = BookingController::new(&state);
    let response = controller.transition(&auth, id, request).await?;
    Ok(Json(response))
}
