use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ApiError,
    store::{without_id, Document},
    validate::checked_email,
};

/// Body of `POST /users`: a profile keyed by email (name, photo URL and so on pass through).
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(flatten)]
    pub profile: Document,
}

impl NewUser {
    pub fn into_document(self) -> Result<Document, ApiError> {
        let email = checked_email(&self.email)?;
        let mut doc = without_id(self.profile);
        doc.insert("email".into(), Value::String(email));
        Ok(doc)
    }
}
