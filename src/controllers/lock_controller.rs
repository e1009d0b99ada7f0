//! Controller del soft-lock de coches

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::lock_dto::{LockRequest, LockResponse, ReleaseResponse};
use crate::services::lock_service::LockService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct LockController {
    service: LockService,
}

impl LockController {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: LockService::new(state.pool.clone(), state.config.lock_ttl_minutes),
        }
    }

    pub async fn acquire(
        &self,
        car_id: Uuid,
        request: LockRequest,
    ) -> Result<ApiResponse<LockResponse>, AppError> {
        request.validate()?;

        let grant = self
            .service
            .acquire(car_id, &request.session_id, Utc::now())
            .await?;

        Ok(ApiResponse::success(LockResponse {
            locked: true,
            locked_until: grant.locked_until,
        }))
    }

    pub async fn release(
        &self,
        car_id: Uuid,
        request: LockRequest,
    ) -> Result<ApiResponse<ReleaseResponse>, AppError> {
        request.validate()?;

        self.service.release(car_id, &request.session_id).await?;

        Ok(ApiResponse::success(ReleaseResponse { released: true }))
    }
}
