use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use smstodo_core::TodoError;

// ---------------------------------------------------------------------------
// Sentinels for explicit 400/401 responses
// ---------------------------------------------------------------------------

/// Private sentinel carrying an explicit HTTP 400 through the
/// `anyhow::Error` chain without touching the `TodoError` enum.
#[derive(Debug)]
struct MalformedRequestError(String);

impl std::fmt::Display for MalformedRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MalformedRequestError {}

/// Private sentinel carrying an explicit HTTP 401.
#[derive(Debug)]
struct UnauthorizedError(String);

impl std::fmt::Display for UnauthorizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnauthorizedError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// 400 Bad Request — malformed or incomplete webhook payload.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(MalformedRequestError(msg.into()).into())
    }

    /// 401 Unauthorized — signature verification failed.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(UnauthorizedError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(e) = self.0.downcast_ref::<MalformedRequestError>() {
            let body = serde_json::json!({ "error": e.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }
        if let Some(e) = self.0.downcast_ref::<UnauthorizedError>() {
            let body = serde_json::json!({ "error": e.0.clone() });
            return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<TodoError>() {
            match e {
                TodoError::InvalidPhoneNumber(_) => StatusCode::BAD_REQUEST,
                TodoError::MissingConfig(_) | TodoError::InvalidConfig { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                TodoError::Store(_)
                | TodoError::SmsSend(_)
                | TodoError::Io(_)
                | TodoError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
