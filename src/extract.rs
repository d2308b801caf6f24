//! Request-body extraction for document routes.
//!
//! Clients post either JSON or `multipart/form-data` (profile and job forms carry an `image`
//! part). Both end up as one flat [`Document`] that typed DTOs are then parsed from.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, store::Document};

/// Body limit for routes that take a photo alongside the form fields.
pub const FORM_BODY_LIMIT: usize = 20 * 1024 * 1024;

pub struct FormDocument(pub Document);

#[async_trait]
impl<S> FromRequest<S> for FormDocument
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(doc) = Json::<Document>::from_request(req, state)
                .await
                .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
            return Ok(Self(doc));
        }

        let mut mp = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;

        let mut doc = Document::new();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                // Uploaded files are not kept.
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
                debug!(field = %name, size = bytes.len(), "discarding uploaded file");
                continue;
            }
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;
            doc.insert(name, Value::String(text));
        }
        Ok(Self(doc))
    }
}

/// Parses a typed request body out of a document, reporting schema mismatches as validation
/// errors.
pub fn parse_document<T: DeserializeOwned>(doc: Document) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| ApiError::validation(e.to_string()))
}

/// Parses a record identifier taken from the URL path.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::validation(format!("invalid id {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    async fn extract(req: Request) -> Result<Document, ApiError> {
        FormDocument::from_request(req, &()).await.map(|FormDocument(d)| d)
    }

    #[tokio::test]
    async fn json_body_becomes_document() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"a@x.com","age":3}"#))
            .unwrap();
        let doc = extract(req).await.unwrap();
        assert_eq!(doc["email"], "a@x.com");
        assert_eq!(doc["age"], 3);
    }

    #[tokio::test]
    async fn multipart_keeps_text_and_drops_files() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nAda\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n\x01\x02\x03\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let req = Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let doc = extract(req).await.unwrap();
        assert_eq!(doc.get("name"), Some(&Value::String("Ada".into())));
        assert!(doc.get("image").is_none());
    }

    #[tokio::test]
    async fn non_object_json_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("[1,2]"))
            .unwrap();
        let err = extract(req).await.map(|_| ()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn parse_id_rejects_non_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("42"), Err(ApiError::Validation(_))));
    }

    #[test]
    fn parse_document_reports_schema_errors() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            email: String,
        }
        let err = parse_document::<Needs>(Document::new()).unwrap_err();
        assert!(err.to_string().contains("email"));
    }
}
