// Error handling module for the rental API
// Maps engine errors onto HTTP responses with a consistent JSON body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::rental::RentalError;

/// Error type returned by every handler
///
/// Each variant maps to one HTTP status code.
#[derive(Debug)]
pub enum ApiError {
    /// Request DTO failed `validator` checks (400)
    ValidationError(validator::ValidationErrors),

    /// A booking rule or request value was rejected (400)
    BadRequest(String),

    /// Unknown vehicle, customer or booking (404)
    NotFound { resource: String, id: String },

    /// Duplicate key or a still-referenced entity (409)
    Conflict { message: String },

    /// Details are logged, never sent to the client (500)
    InternalError(String),

    /// Missing or unreadable identity headers (401)
    Unauthorized(String),

    /// Caller may not act on this resource (403)
    Forbidden(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable code such as "VALIDATION_ERROR"
    pub error_code: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_error_response();
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    /// Build the status and body, logging by severity:
    /// `error!` for 500s, `warn!` for conflicts and access problems,
    /// `debug!` for ordinary client mistakes.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let body = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                let mut body = ErrorResponse::new("VALIDATION_ERROR", "Request validation failed");
                body.details = serde_json::to_value(errors).ok();
                body
            }
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                ErrorResponse::new("BAD_REQUEST", message.clone())
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                ErrorResponse::new("NOT_FOUND", format!("{} with id {} not found", resource, id))
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                ErrorResponse::new("CONFLICT", message.clone())
            }
            ApiError::InternalError(message) => {
                error!("Internal error: {}", message);
                ErrorResponse::new("INTERNAL_ERROR", "An internal server error occurred")
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized access attempt: {}", message);
                ErrorResponse::new("UNAUTHORIZED", message.clone())
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                ErrorResponse::new("FORBIDDEN", message.clone())
            }
        };
        (status, body)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<RentalError> for ApiError {
    fn from(error: RentalError) -> Self {
        let not_found = |resource: &str, id: String| ApiError::NotFound {
            resource: resource.to_string(),
            id,
        };

        match error {
            RentalError::InvalidBooking(reason) => ApiError::BadRequest(reason),
            RentalError::ValidationError(message) => ApiError::BadRequest(message),
            RentalError::CustomerNotFound(id) => not_found("Customer", id),
            RentalError::VehicleNotFound(id) => not_found("Vehicle", id),
            RentalError::BookingNotFound(id) => not_found("Booking", id),
            RentalError::Conflict(message) => ApiError::Conflict { message },
            RentalError::InvalidTransition(message) => ApiError::Conflict { message },
            RentalError::Forbidden(message) => ApiError::Forbidden(message),
            RentalError::Storage(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_rental_errors_map_to_status_codes() {
        let cases = vec![
            (RentalError::InvalidBooking("x".into()), StatusCode::BAD_REQUEST),
            (RentalError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (RentalError::CustomerNotFound("C1".into()), StatusCode::NOT_FOUND),
            (RentalError::VehicleNotFound("V1".into()), StatusCode::NOT_FOUND),
            (RentalError::BookingNotFound("B1".into()), StatusCode::NOT_FOUND),
            (RentalError::Conflict("x".into()), StatusCode::CONFLICT),
            (RentalError::InvalidTransition("x".into()), StatusCode::CONFLICT),
            (RentalError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                RentalError::Storage(StorageError::Unavailable("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status_code(), expected);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (status, body) = ApiError::InternalError("disk full at /data".into()).to_error_response();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("disk"));
    }

    #[test]
    fn test_not_found_message() {
        let (_, body) = ApiError::from(RentalError::BookingNotFound("B9".into())).to_error_response();
        assert_eq!(body.error_code, "NOT_FOUND");
        assert_eq!(body.message, "Booking with id B9 not found");
    }
}
