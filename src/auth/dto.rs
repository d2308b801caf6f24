use serde::{Deserialize, Serialize};

/// Request body for `POST /jwt`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
}

/// `{"success": true}` acknowledgement returned by the session endpoints.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
