//! HTTP error taxonomy and the JSON envelope failures are rendered into.
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::constants::*;
use crate::validation::Validation;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("{}", ERR_INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("{}", ERR_DUPLICATE_USER)]
    DuplicateUser,

    #[error("{}", ERR_NO_TOKEN)]
    MissingToken,

    #[error("{}", ERR_INVALID_TOKEN)]
    InvalidToken,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::DuplicateUser => StatusCode::CONFLICT,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::DuplicateUser => "DUPLICATE_USER",
            ApiError::MissingToken => "NO_TOKEN",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    ok: bool,
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let (message, details) = match self {
            ApiError::Validation { message, details } => {
                let details = (!details.is_empty()).then(|| serde_json::json!(details));
                (message, details)
            }
            ApiError::Internal(err) => {
                error!(error = ?err, "request failed");
                // Causes are only exposed by development builds.
                let details = cfg!(debug_assertions).then(|| serde_json::json!(format!("{err:#}")));
                (ERR_INTERNAL.to_string(), details)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorEnvelope {
            ok: false,
            error: ErrorBody {
                message,
                code,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<Validation> for ApiError {
    fn from(validation: Validation) -> Self {
        ApiError::Validation {
            message: validation.errors.join(" "),
            details: validation.errors,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateUser => ApiError::DuplicateUser,
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::WeakPassword | AuthError::InvalidUsername(_) | AuthError::InvalidName(_) => {
                ApiError::bad_request(err.to_string())
            }
            AuthError::Token(e) => ApiError::Internal(e.into()),
            AuthError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// `axum::Json` whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejections use the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::DuplicateUser.status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::NotFound("Entry").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn validation_error_lists_details() {
        let validation = Validation {
            errors: vec!["first.".to_string(), "second.".to_string()],
        };
        let (status, body) = body_json(validation.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["message"], "first. second.");
        assert_eq!(body["error"]["details"][1], "second.");
    }

    #[tokio::test]
    async fn token_errors_carry_codes() {
        let (status, body) = body_json(ApiError::MissingToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "NO_TOKEN");

        let (status, body) = body_json(ApiError::InvalidToken).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
        assert_eq!(body["error"]["message"], ERR_INVALID_TOKEN);
    }

    #[tokio::test]
    async fn internal_error_message_is_generic() {
        let (status, body) =
            body_json(ApiError::Internal(anyhow::anyhow!("disk on fire"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], ERR_INTERNAL);
    }
}
