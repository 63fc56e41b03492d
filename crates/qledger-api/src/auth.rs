//! Caller identity.
//!
//! Authentication happens upstream. The gateway forwards the verified user
//! ID in the `X-User-Id` header and this extractor only checks it is sane.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the authenticated user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Longest accepted user ID.
const MAX_USER_ID_LEN: usize = 128;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
}

fn validate_user_id(raw: &str) -> Result<String, ApiError> {
    let user_id = raw.trim();
    if user_id.is_empty() {
        return Err(ApiError::unauthorized("Empty X-User-Id header"));
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(ApiError::unauthorized("X-User-Id header too long"));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | ':' | '|'))
    {
        return Err(ApiError::unauthorized("X-User-Id contains invalid characters"));
    }
    Ok(user_id.to_string())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("X-User-Id header is not valid text"))?;

        Ok(Self {
            user_id: validate_user_id(raw)?,
        })
    }
}
