//! `x-user-id` header extraction.
//!
//! There is no authentication: the browser picks its own user id and sends
//! it on every request. Write endpoints mint one when it is missing; read
//! endpoints require it.

use std::convert::Infallible;

use axum::http::request::Parts;
use time::OffsetDateTime;

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's user id, if the header is present and non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdHeader(pub Option<String>);

impl UserIdHeader {
    /// # Errors
    ///
    /// Returns [`ApiError::UserIdRequired`] when the header is absent.
    pub fn require(self) -> Result<String, ApiError> {
        self.0.ok_or(ApiError::UserIdRequired)
    }

    /// Header value, or a fresh `user_<unix_ms>` id.
    #[must_use]
    pub fn or_generate(self) -> String {
        self.0.unwrap_or_else(generate_user_id)
    }
}

#[must_use]
pub fn generate_user_id() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("user_{millis}")
}

impl<S> axum::extract::FromRequestParts<S> for UserIdHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        Ok(Self(value))
    }
}
