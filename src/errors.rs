use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::MalformedInput(msg) => AppError::BadRequest(msg),
            DomainError::Upstream(msg) => AppError::BadGateway(msg),
            DomainError::Storage(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::NotFound(_) | AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => {
                self.to_string()
            }
            AppError::BadGateway(detail) => {
                log::error!("Shopping service call failed: {}", detail);
                "Shopping service unavailable".to_string()
            }
            AppError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                "Internal server error".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_returns_400() {
        let resp = AppError::BadRequest("customerInfo.firstName".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn payload_too_large_returns_413() {
        let resp = AppError::PayloadTooLarge("upload exceeds 10 bytes".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_display() {
        assert_eq!(
            AppError::NotFound("Order not found".to_string()).to_string(),
            "Order not found"
        );
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::order_not_found().into();
        assert!(matches!(app_err, AppError::NotFound(_)));
    }

    #[test]
    fn domain_storage_maps_to_app_internal() {
        let app_err: AppError = DomainError::Storage("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[test]
    fn domain_upstream_maps_to_bad_gateway() {
        let app_err: AppError = DomainError::Upstream("503".to_string()).into();
        assert_eq!(app_err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn domain_malformed_input_maps_to_bad_request() {
        let app_err: AppError = DomainError::MalformedInput("expected `[`".to_string()).into();
        assert_eq!(app_err.status_code(), StatusCode::BAD_REQUEST);
    }
}
