use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::NewUser;
use crate::{
    error::{ApiError, ApiResult},
    extract::{parse_document, FormDocument, FORM_BODY_LIMIT},
    state::AppState,
    store::{Collection, InsertOutcome},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    FormDocument(body): FormDocument,
) -> ApiResult<Json<InsertOutcome>> {
    let user: NewUser = parse_document(body)?;
    let doc = user.into_document()?;

    let outcome = state
        .store
        .insert_one(Collection::Users, doc)
        .await
        .map_err(|e| {
            warn!(error = %e, "insert user failed");
            ApiError::from(e)
        })?;
    info!(user_id = %outcome.inserted_id, "user registered");
    Ok(Json(outcome))
}
