//! Caller identity for HTTP requests.
//!
//! The node sits behind an identity layer that authenticates the account and forwards it
//! in the `X-Bounty-Caller` header, as a bech32 (`bnty1...`) or hex address. Handlers that
//! need a caller take a [`Caller`] argument; requests without a usable header are refused
//! before the handler runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bounty_types::AccountAddress;
use serde_json::json;

pub const CALLER_HEADER: &str = "X-Bounty-Caller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub AccountAddress);

#[derive(Debug)]
pub enum CallerError {
    MissingHeader,
    InvalidAddress(String),
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        let message = match self {
            CallerError::MissingHeader => format!("Missing header: {}", CALLER_HEADER),
            CallerError::InvalidAddress(err) => format!("Invalid caller address: {}", err),
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": message, "kind": "unauthenticated" })),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = CallerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CallerError::MissingHeader)?;

        AccountAddress::from_string(raw)
            .map(Caller)
            .map_err(|e| CallerError::InvalidAddress(e.to_string()))
    }
}
