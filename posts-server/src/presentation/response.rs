use crate::domain::{DomainError, ValidationErrors};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// Either a plain sentence or, for rejected input, the per-field failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    Fields(ValidationErrors),
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ValidationErrors> for Message {
    fn from(errors: ValidationErrors) -> Self {
        Self::Fields(errors)
    }
}

/// Body of every response: `{data, message, status}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub message: Message,
    pub status: u16,
}

/// Wraps a payload in the envelope and uses `status` for the HTTP status
/// line as well.
pub fn envelope<T: Serialize>(
    data: Option<T>,
    message: impl Into<Message>,
    status: StatusCode,
) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        data,
        message: message.into(),
        status: status.as_u16(),
    })
}

pub fn ok<T: Serialize>(data: T, message: &str) -> HttpResponse {
    envelope(Some(data), message, StatusCode::OK)
}

pub fn error_to_response(err: DomainError) -> HttpResponse {
    let status = StatusCode::from_u16(err.to_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match err {
        DomainError::Validation(errors) => envelope(None::<()>, errors, status),
        DomainError::DatabaseError(_) | DomainError::InternalError(_) => {
            tracing::error!("Request failed: {}", err);
            envelope(None::<()>, "Internal server error", status)
        }
        other => envelope(None::<()>, other.to_string(), status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(resp: HttpResponse) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_rt::test]
    async fn status_is_mirrored_in_the_body() {
        let resp = envelope(Some(vec![1, 2]), "ok", StatusCode::OK);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            body_of(resp).await,
            serde_json::json!({ "data": [1, 2], "message": "ok", "status": 200 })
        );
    }

    #[actix_rt::test]
    async fn validation_errors_become_the_message() {
        let resp = error_to_response(DomainError::validation("title", "The title field is required."));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_of(resp).await,
            serde_json::json!({
                "data": null,
                "message": { "title": ["The title field is required."] },
                "status": 404
            })
        );
    }

    #[actix_rt::test]
    async fn storage_details_are_not_leaked() {
        let resp = error_to_response(DomainError::DatabaseError("password=hunter2".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(resp).await;
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["status"], 500);
    }

    #[test]
    fn message_deserializes_both_shapes() {
        let text: Message = serde_json::from_str("\"ok\"").unwrap();
        assert_eq!(text, Message::Text("ok".into()));

        let fields: Message = serde_json::from_str(r#"{"title":["taken"]}"#).unwrap();
        match fields {
            Message::Fields(errors) => assert_eq!(errors.messages("title"), ["taken".to_string()]),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
