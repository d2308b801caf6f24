use axum::{
    extract::{FromRef, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        claims::Identity,
        dto::{SessionRequest, Success},
        jwt::TokenCodec,
        session::{begin_session, end_session},
    },
    error::{ApiError, ApiResult},
    extract::{parse_document, FormDocument},
    state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/jwt", post(issue_session))
        .route("/logout", post(logout))
}

#[instrument(skip(state, body))]
pub async fn issue_session(
    State(state): State<AppState>,
    FormDocument(body): FormDocument,
) -> ApiResult<impl IntoResponse> {
    let payload: SessionRequest = parse_document(body)?;
    let identity = Identity {
        email: payload.email,
    };

    let codec = TokenCodec::from_ref(&state);
    let cookie = begin_session(&codec, &identity).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e.into())
    })?;

    info!(email = %identity.email, "session started");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(Success::ok()),
    ))
}

#[instrument]
pub async fn logout() -> impl IntoResponse {
    info!("session cleared");
    (
        AppendHeaders([(SET_COOKIE, end_session().to_string())]),
        Json(Success::ok()),
    )
}
