use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::models::PaymentStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("This router is not selling codes at the moment")]
    RouterDisabled,

    #[error("{0}")]
    Validation(String),

    #[error("Payment is {from} and cannot move to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Payment was cancelled")]
    PaymentCancelled,

    #[error("Payment {payment_id} succeeded but no code is available, please contact support")]
    NoVoucherAvailable { payment_id: String },

    #[error("Online payment is not configured for this router")]
    ProviderNotConfigured,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored document is invalid: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: String,
    pub reason: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::RouterDisabled => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidTransition { .. } | AppError::NoVoucherAvailable { .. } => {
                StatusCode::CONFLICT
            }
            AppError::PaymentFailed(_) | AppError::PaymentCancelled => {
                StatusCode::PAYMENT_REQUIRED
            }
            AppError::ProviderNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user. Store failures never leak their details.
    pub fn reason(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Corrupt(_) => {
                "Service temporarily unavailable, please try again later".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = ErrorBody {
            status: "ERROR".to_string(),
            reason: self.reason(),
        };
        (status, Json(body)).into_response()
    }
}
