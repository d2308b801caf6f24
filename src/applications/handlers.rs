use axum::{
    extract::State,
    routing::get,
    Extension, Json, Router,
};
use tracing::{info, instrument, warn};

use super::{dto::NewApplication, repo};
use crate::{
    auth::claims::Claims,
    error::{ApiError, ApiResult},
    extract::{parse_document, FormDocument},
    jobs,
    state::AppState,
    store::{Document, InsertOutcome},
};

pub fn application_routes() -> Router<AppState> {
    Router::new().route("/applied-jobs", get(list_my_applications).post(apply))
}

/// Applications belonging to the session's email.
#[instrument(skip(state, claims), fields(email = %claims.identity.email))]
pub async fn list_my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<Document>>> {
    let email = Some(claims.identity.email.as_str()).filter(|e| !e.is_empty());
    let applications = repo::list_for(state.store.as_ref(), email)
        .await
        .map_err(|e| {
            warn!(error = %e, "list applications failed");
            ApiError::from(e)
        })?;
    Ok(Json(applications))
}

/// Files an application and counts it against the job.
#[instrument(skip(state, body))]
pub async fn apply(
    State(state): State<AppState>,
    FormDocument(body): FormDocument,
) -> ApiResult<Json<InsertOutcome>> {
    let application: NewApplication = parse_document(body)?;
    let job_id = application.job_id;
    let doc = application.into_document()?;

    let store = state.store.as_ref();
    let outcome = repo::insert(store, doc).await.map_err(|e| {
        warn!(error = %e, %job_id, "insert application failed");
        ApiError::from(e)
    })?;

    let counted = jobs::repo::record_applicant(store, job_id)
        .await
        .map_err(|e| {
            warn!(error = %e, %job_id, "applicant count update failed");
            ApiError::from(e)
        })?;
    if counted.matched_count == 0 {
        warn!(%job_id, "application filed for unknown job");
    }

    info!(application_id = %outcome.inserted_id, %job_id, "application filed");
    Ok(Json(outcome))
}
