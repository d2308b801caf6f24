use axum::{
    extract::{DefaultBodyLimit, Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{JobUpdate, NewJob},
    repo,
};
use crate::{
    auth::claims::Claims,
    error::{ApiError, ApiResult},
    extract::{parse_document, parse_id, FormDocument, FORM_BODY_LIMIT},
    state::AppState,
    store::{DeleteOutcome, Document, InsertOutcome, UpdateOutcome},
};

pub fn job_routes() -> Router<AppState> {
    let form = Router::new()
        .route("/add-job", post(add_job))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT));

    Router::new()
        .route("/all-jobs", get(list_jobs))
        .route("/all-jobs/:id", get(get_job))
        .route("/my-jobs/:id", put(update_job).delete(delete_job))
        .merge(form)
}

#[instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let jobs = repo::list_all(state.store.as_ref()).await.map_err(|e| {
        warn!(error = %e, "list jobs failed");
        ApiError::from(e)
    })?;
    Ok(Json(jobs))
}

/// Unknown ids answer `null` rather than an error.
#[instrument(skip(state, claims), fields(email = %claims.identity.email))]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Document>>> {
    let id = parse_id(&id)?;
    let job = repo::find_by_id(state.store.as_ref(), id)
        .await
        .map_err(|e| {
            warn!(error = %e, %id, "get job failed");
            ApiError::from(e)
        })?;
    if job.is_none() {
        debug!(%id, "job not found");
    }
    Ok(Json(job))
}

#[instrument(skip(state, body))]
pub async fn add_job(
    State(state): State<AppState>,
    FormDocument(body): FormDocument,
) -> ApiResult<Json<InsertOutcome>> {
    let job: NewJob = parse_document(body)?;
    job.validate()?;

    let outcome = repo::insert(state.store.as_ref(), job.into_document())
        .await
        .map_err(|e| {
            warn!(error = %e, "insert job failed");
            ApiError::from(e)
        })?;
    info!(job_id = %outcome.inserted_id, "job created");
    Ok(Json(outcome))
}

#[instrument(skip(state, body))]
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    FormDocument(body): FormDocument,
) -> ApiResult<Json<UpdateOutcome>> {
    let id = parse_id(&id)?;
    let patch = parse_document::<JobUpdate>(body)?.into_patch()?;

    let outcome = repo::update(state.store.as_ref(), id, patch)
        .await
        .map_err(|e| {
            warn!(error = %e, %id, "update job failed");
            ApiError::from(e)
        })?;
    info!(%id, matched = outcome.matched_count, "job updated");
    Ok(Json(outcome))
}

#[instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteOutcome>> {
    let id = parse_id(&id)?;
    let outcome = repo::delete(state.store.as_ref(), id).await.map_err(|e| {
        warn!(error = %e, %id, "delete job failed");
        ApiError::from(e)
    })?;
    info!(%id, deleted = outcome.deleted_count, "job deleted");
    Ok(Json(outcome))
}
