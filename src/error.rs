use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::coupon_lifecycle::CouponLifecycleError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("You have already redeemed this coupon")]
    AlreadyRedeemed,

    #[error("This coupon has expired")]
    Expired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_debug = format!("{:?}", self);

        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::AlreadyRedeemed => (
                StatusCode::CONFLICT,
                "You have already redeemed this coupon".to_string(),
            ),
            AppError::Expired => (StatusCode::GONE, "This coupon has expired".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_debug,
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CouponLifecycleError> for AppError {
    fn from(err: CouponLifecycleError) -> Self {
        match err {
            CouponLifecycleError::Validation(msg) => AppError::Validation(msg),
            CouponLifecycleError::StoreNotFound(id) => {
                AppError::NotFound(format!("Store {} not found", id))
            }
            CouponLifecycleError::CouponNotFound(id) => {
                AppError::NotFound(format!("Coupon {} not found", id))
            }
            CouponLifecycleError::Expired => AppError::Expired,
            CouponLifecycleError::AlreadyRedeemed => AppError::AlreadyRedeemed,
            CouponLifecycleError::Database(e) => AppError::Database(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
