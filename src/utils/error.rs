use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// Upload policy violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Unsupported file type: {0}. Allowed: jpeg, png, gif, webp")]
    UnsupportedType(String),
}

/// Application error taxonomy shared by services and handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("{0}")]
    NotFound(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl AppError {
    /// Message shown to the caller. Server-side failures never leak detail.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ExternalService(_) | AppError::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Payload(PayloadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Payload(PayloadError::UnsupportedType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalService(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, AppError::ExternalService(_) | AppError::Internal(_)) {
            log::error!("❌ {}", self);
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            message: self.public_message(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::ExternalService(format!("Database error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::Conflict("User already exists".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "User already exists");
    }

    #[test]
    fn server_errors_are_collapsed() {
        let err = AppError::ExternalService("connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.public_message(), "Server error");

        let err = AppError::Internal("disk full".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Server error");
    }

    #[test]
    fn payload_errors_map_to_distinct_statuses() {
        let too_large: AppError = PayloadError::TooLarge { limit: 10 }.into();
        assert_eq!(too_large.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let wrong_type: AppError = PayloadError::UnsupportedType("text/plain".into()).into();
        assert_eq!(wrong_type.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(wrong_type.public_message().contains("text/plain"));
    }
}
