//! Rutas del soft-lock de coches
//!
//! La UI adquiere el lock al entrar al formulario y lo refresca con
//! heartbeat (~30s); lo libera al navegar fuera o al enviar la reserva.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::lock_controller::LockController;
use crate::dto::common::ApiResponse;
use crate::dto::lock_dto::{LockRequest, LockResponse, ReleaseResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_lock_router() -> Router<AppState> {
    Router::new().route("/:car_id/lock", post(acquire_lock).delete(release_lock))
}

async fn acquire_lock(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Json(request): Json<LockRequest>,
) -> Result<Json<ApiResponse<LockResponse>>, AppError> {
    let controller = LockController::new(&state);
    let response = controller.acquire(car_id, request).await?;
    Ok(Json(response))
}

async fn release_lock(
    State(state): State<AppState>,
    Path(car_id): Path<Uuid>,
    Json(request): Json<LockRequest>,
) -> Result<Json<ApiResponse<ReleaseResponse>>, AppError> {
    let controller = LockController::new(&state);
    let response = controller.release(car_id, request).await?;
    Ok(Json(response))
}
