use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::password::PasswordError;
use crate::repo::RepoError;
use crate::token::TokenError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorBody {
    pub error: ErrorDetail,
}

/// Boundary error. Messages are fixed strings; internal detail is logged, never returned.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid request")] Validation,
    #[error("Invalid or missing token")] Unauthorized,
    #[error("Email already registered")] EmailTaken,
    #[error("Request timed out")] Timeout,
    #[error("Something went wrong")] Internal,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation => "VALIDATION_ERROR",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::EmailTaken => "EMAIL_TAKEN",
            ApiError::Timeout => "TIMEOUT",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => ApiError::Unauthorized,
            RepoError::Conflict => ApiError::EmailTaken,
            RepoError::Invalid(_) => ApiError::Validation,
            RepoError::Internal(detail) => {
                error!(error = %detail, "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        error!(error = %e, "password hashing failure");
        ApiError::Internal
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => ApiError::Unauthorized,
            TokenError::Signing(inner) => {
                error!(error = %inner, "token signing failure");
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiErrorBody {
            error: ErrorDetail { code: self.code().to_string(), message: self.to_string() },
        })
    }
}
