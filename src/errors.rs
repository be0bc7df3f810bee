use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Domain(e) => e.kind(),
            AppError::Internal(_) => "Internal",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        let AppError::Domain(e) = self else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            DomainError::ProductNotFound(_)
            | DomainError::OrderNotFound(_)
            | DomainError::TableNotFound
            | DomainError::ReservationNotFound(_)
            | DomainError::PartyNotFound
            | DomainError::PartyCartNotFound(_)
            | DomainError::CartItemNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::DuplicateActiveOrder(_)
            | DomainError::ConcurrentModification(_)
            | DomainError::AlreadyPaid(_)
            | DomainError::OrderCancelled(_)
            | DomainError::TimeConflict(_)
            | DomainError::CapacityReached { .. }
            | DomainError::TableAlreadyHasParty(_)
            | DomainError::AlreadyMember(_) => StatusCode::CONFLICT,
            DomainError::EmptyOrder | DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(serde_json::json!({
            "error": self.kind(),
            "message": message
        }))
    }
}
