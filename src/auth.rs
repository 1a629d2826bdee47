use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use tracing::error;

use crate::error::ApiError;
use crate::routes::AppState;

const BEARER_PREFIX: &str = "bearer ";

/// Pull the token out of an `Authorization` value. The scheme is matched case-insensitively.
pub fn bearer_token(value: &str) -> Option<&str> {
    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    let token = value[BEARER_PREFIX.len()..].trim();
    (!token.is_empty()).then_some(token)
}

/// Extractor yielding the id of the user a valid bearer token was issued to.
///
/// Handlers that take an `AuthUser` never run for unauthenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

impl AuthUser {
    fn authenticate(req: &HttpRequest) -> Result<Self, ApiError> {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            error!("AppState missing from app data; cannot verify tokens");
            return Err(ApiError::Internal);
        };
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;
        let user_id = state.tokens.verify(token)?;
        Ok(AuthUser { user_id })
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        ready(Self::authenticate(req))
    }
}
