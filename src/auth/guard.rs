use axum::{
    extract::{FromRef, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use tracing::warn;

use super::{jwt::TokenCodec, session::SESSION_COOKIE};
use crate::{error::ApiError, state::AppState};

/// Gate for protected routes.
///
/// No `token` cookie means 401 and the codec is never consulted; a cookie whose token fails
/// verification for any reason means 403. On success the verified [`Claims`] are placed in the
/// request extensions for the handler to read.
///
/// [`Claims`]: super::claims::Claims
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = session_token(request.headers()) else {
        warn!(path = %request.uri().path(), "no session cookie");
        return Err(ApiError::Unauthorized);
    };

    let codec = TokenCodec::from_ref(&state);
    let claims = codec.verify(&token).map_err(|e| {
        warn!(error = %e, path = %request.uri().path(), "session token rejected");
        ApiError::Forbidden
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Value of the session cookie, if the request carries a non-empty one.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
