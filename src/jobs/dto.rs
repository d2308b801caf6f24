use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ApiError,
    store::{without_id, Document},
};

pub const APPLICANTS_FIELD: &str = "applicantsNumber";

/// Number of applicants on a posting. Forms submit it as text, so numeric strings are
/// accepted; anything that isn't a non-negative integer is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCount", into = "i64")]
pub struct ApplicantCount(i64);

impl ApplicantCount {
    pub fn get(self) -> i64 {
        self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(i64),
    Text(String),
}

impl TryFrom<RawCount> for ApplicantCount {
    type Error = String;

    fn try_from(raw: RawCount) -> Result<Self, Self::Error> {
        let n = match raw {
            RawCount::Int(n) => n,
            RawCount::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("{APPLICANTS_FIELD} must be an integer, got {s:?}"))?,
        };
        if n < 0 {
            return Err(format!("{APPLICANTS_FIELD} must not be negative"));
        }
        Ok(Self(n))
    }
}

impl From<ApplicantCount> for i64 {
    fn from(c: ApplicantCount) -> Self {
        c.0
    }
}

/// Body of `POST /add-job`. Fields beyond the ones named here (description, salary,
/// deadline, ...) are stored as given.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub applicants_number: ApplicantCount,
    #[serde(flatten)]
    pub details: Document,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title must not be empty"));
        }
        Ok(())
    }

    pub fn into_document(self) -> Document {
        let mut doc = without_id(self.details);
        doc.insert("title".into(), Value::String(self.title.trim().to_string()));
        doc.insert(
            APPLICANTS_FIELD.into(),
            Value::from(self.applicants_number.get()),
        );
        doc
    }
}

/// Body of `PUT /my-jobs/:id`; every field is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub applicants_number: Option<ApplicantCount>,
    #[serde(flatten)]
    pub details: Document,
}

impl JobUpdate {
    /// Validates the update and turns it into the fields to merge into the stored job.
    pub fn into_patch(self) -> Result<Document, ApiError> {
        let mut patch = without_id(self.details);
        if let Some(title) = self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ApiError::validation("title must not be empty"));
            }
            patch.insert("title".into(), Value::String(title.to_string()));
        }
        if let Some(count) = self.applicants_number {
            patch.insert(APPLICANTS_FIELD.into(), Value::from(count.get()));
        }
        if patch.is_empty() {
            return Err(ApiError::validation("update has no fields"));
        }
        Ok(patch)
    }
}
