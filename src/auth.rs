use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Scheme word clients must put in front of the key.
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Wrapper type to store the configured API key in Axum state.
#[derive(Clone)]
pub struct ApiKey(pub String);

/// Reason no credential could be taken from the request headers.
///
/// `MissingHeader` means no credential was offered at all; `MalformedHeader`
/// means one was offered but is unusable. Callers that only reject the
/// request can treat both the same, but the distinction is kept for logging
/// and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthHeaderError {
    #[error("no authorization header included")]
    MissingHeader,
    #[error("malformed authorization header")]
    MalformedHeader,
}

/// Extracts the API key from an `Authorization: ApiKey <key>` header.
///
/// The key is returned verbatim - everything after the first space, with no
/// trimming or decoding. Whether the key is actually valid is the caller's
/// concern; this only checks the shape of the header.
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, AuthHeaderError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(v) => v.to_str().map_err(|_| AuthHeaderError::MalformedHeader)?,
        None => return Err(AuthHeaderError::MissingHeader),
    };

    if value.is_empty() {
        return Err(AuthHeaderError::MissingHeader);
    }

    match value.split_once(' ') {
        Some((scheme, key)) if scheme == API_KEY_SCHEME && !key.is_empty() => Ok(key),
        _ => Err(AuthHeaderError::MalformedHeader),
    }
}

/// Middleware that validates the `Authorization: ApiKey <key>` header
/// against the configured API key.
pub async fn api_key_middleware(
    State(api_key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = match extract_api_key(request.headers()) {
        Ok(key) => key,
        Err(err) => {
            tracing::warn!(%err, "Rejected request");
            return Err(err.into());
        }
    };

    if bool::from(presented.as_bytes().ct_eq(api_key.0.as_bytes())) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Invalid API key attempt");
        Err(AppError::InvalidApiKey)
    }
}
