use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::ApiError,
    store::{without_id, Document},
    validate::checked_email,
};

/// Body of `POST /applied-jobs`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub details: Document,
}

impl NewApplication {
    pub fn into_document(self) -> Result<Document, ApiError> {
        let email = checked_email(&self.email)?;
        let mut doc = without_id(self.details);
        doc.insert("jobId".into(), Value::String(self.job_id.to_string()));
        doc.insert("email".into(), Value::String(email));
        Ok(doc)
    }
}
