use crate::store::{Collection, Document, DocumentStore, Filter, InsertOutcome, StoreError};

pub async fn insert(
    store: &dyn DocumentStore,
    application: Document,
) -> Result<InsertOutcome, StoreError> {
    store.insert_one(Collection::AppliedJobs, application).await
}

/// Applications filed under `email`, or every application when no email is given.
pub async fn list_for(
    store: &dyn DocumentStore,
    email: Option<&str>,
) -> Result<Vec<Document>, StoreError> {
    let filter = match email {
        Some(email) => Filter::eq("email", email),
        None => Filter::all(),
    };
    store.find(Collection::AppliedJobs, &filter).await
}
