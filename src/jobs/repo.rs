use uuid::Uuid;

use super::dto::APPLICANTS_FIELD;
use crate::store::{
    Collection, DeleteOutcome, Document, DocumentStore, Filter, InsertOutcome, StoreError, Update,
    UpdateOutcome,
};

/// Every posting, oldest first.
pub async fn list_all(store: &dyn DocumentStore) -> Result<Vec<Document>, StoreError> {
    store.find(Collection::Jobs, &Filter::all()).await
}

pub async fn find_by_id(
    store: &dyn DocumentStore,
    id: Uuid,
) -> Result<Option<Document>, StoreError> {
    store.find_one(Collection::Jobs, &Filter::by_id(id)).await
}

pub async fn insert(store: &dyn DocumentStore, job: Document) -> Result<InsertOutcome, StoreError> {
    store.insert_one(Collection::Jobs, job).await
}

pub async fn update(
    store: &dyn DocumentStore,
    id: Uuid,
    patch: Document,
) -> Result<UpdateOutcome, StoreError> {
    store
        .update_one(Collection::Jobs, &Filter::by_id(id), &Update::Set(patch))
        .await
}

pub async fn delete(store: &dyn DocumentStore, id: Uuid) -> Result<DeleteOutcome, StoreError> {
    store.delete_one(Collection::Jobs, &Filter::by_id(id)).await
}

/// Bumps the applicant counter in a single store-side update.
pub async fn record_applicant(
    store: &dyn DocumentStore,
    id: Uuid,
) -> Result<UpdateOutcome, StoreError> {
    store
        .update_one(
            Collection::Jobs,
            &Filter::by_id(id),
            &Update::Inc {
                field: APPLICANTS_FIELD.into(),
                by: 1,
            },
        )
        .await
}
