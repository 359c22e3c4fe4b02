use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use userlink_assistant::AssistantError;
use userlink_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("OpenAI API key is not set")]
    ConfigurationMissing,

    #[error("{0}")]
    Remote(String),

    #[error("Assistant run failed")]
    RunFailed,

    #[error("No response from assistant")]
    NoReply,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownResource(_) | StoreError::NotFound { .. } => {
                ServerError::NotFound(err.to_string())
            }
            StoreError::Conflict { .. } => ServerError::Conflict(err.to_string()),
            StoreError::InvalidRecord(msg) => ServerError::BadRequest(msg),
            other => ServerError::Storage(other.to_string()),
        }
    }
}

impl From<AssistantError> for ServerError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::MissingApiKey => ServerError::ConfigurationMissing,
            other => ServerError::Remote(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ServerError::ConfigurationMissing => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            ServerError::Remote(_) | ServerError::RunFailed | ServerError::NoReply => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            ServerError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_taxonomy() {
        let err: ServerError = StoreError::UnknownResource("widgets".into()).into();
        assert!(matches!(err, ServerError::NotFound(_)));
        assert_eq!(err.to_string(), "Resource \"widgets\" not found");

        let err: ServerError = StoreError::InvalidRecord("bad".into()).into();
        assert!(matches!(err, ServerError::BadRequest(_)));

        let err: ServerError = StoreError::Conflict {
            resource: "users".into(),
            id: "u1".into(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn remote_errors_keep_remote_message() {
        let err: ServerError = AssistantError::Api {
            status: 400,
            message: "Invalid thread".into(),
        }
        .into();
        assert!(err.to_string().contains("Invalid thread"));

        let err: ServerError = AssistantError::MissingApiKey.into();
        assert!(matches!(err, ServerError::ConfigurationMissing));
        assert_eq!(
            err.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
