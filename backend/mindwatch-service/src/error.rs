/// HTTP-facing error taxonomy for mindwatch-service
///
/// Lower layers keep their own error enums (`FeedError`, `StoreError`,
/// `ClassifierError`); they are folded into `AppError` at the service
/// boundary and rendered as `{"detail": ..., "code": ...}`.
use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use serde::Serialize;

use crate::feed::FeedError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    /// Feed outage, rate limit or rejected credential.
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        retry_after: Option<u64>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
    code: u16,
}

impl AppError {
    /// Message safe to show to API clients.
    fn public_detail(&self) -> String {
        match self {
            AppError::UpstreamUnavailable { .. } => {
                "Social media service is temporarily unavailable, please retry later".to_string()
            }
            AppError::Database(_) | AppError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let detail = self.public_detail();
        let mut builder = HttpResponse::build(status);
        if let AppError::UpstreamUnavailable {
            retry_after: Some(secs),
            ..
        } = self
        {
            builder.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        builder.json(ErrorBody {
            detail: &detail,
            code: status.as_u16(),
        })
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::NotFound(username) => {
                AppError::NotFound(format!("Twitter user '{}' not found", username))
            }
            FeedError::RateLimited { retry_after } => AppError::UpstreamUnavailable {
                message: "rate limit exceeded".to_string(),
                retry_after,
            },
            FeedError::Upstream { .. } | FeedError::Unauthorized(_) => {
                AppError::UpstreamUnavailable {
                    message: err.to_string(),
                    retry_after: None,
                }
            }
            FeedError::Decode(msg) => AppError::Internal(format!("feed decode: {}", msg)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{}: {}", field, reason)
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

/// Renders malformed JSON bodies as 400 with the standard error body.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid request body: {}", err)).into()
}

/// Unparseable ids in the path cannot name an existing record.
pub fn path_error_handler(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound("Resource not found".to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(format!("Invalid query string: {}", err)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, Option<String>, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, retry_after, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_not_found_keeps_detail() {
        let (status, _, body) = render(AppError::from(FeedError::NotFound("ghost".into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Twitter user 'ghost' not found");
        assert_eq!(body["code"], 404);
    }

    #[actix_web::test]
    async fn test_internal_detail_is_hidden() {
        let (status, _, body) =
            render(AppError::Internal("tokenizer exploded at /models/x".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "An internal error occurred");
    }

    #[actix_web::test]
    async fn test_rate_limit_sets_retry_after() {
        let err = AppError::from(FeedError::RateLimited {
            retry_after: Some(42),
        });
        let (status, retry_after, body) = render(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body["detail"].as_str().unwrap().contains("rate"));
        assert_eq!(retry_after.as_deref(), Some("42"));
    }

    #[test]
    fn test_feed_error_mapping() {
        let unauthorized = AppError::from(FeedError::Unauthorized("bad token".into()));
        assert_eq!(unauthorized.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let decode = AppError::from(FeedError::Decode("missing field".into()));
        assert_eq!(decode.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let upstream = AppError::from(FeedError::Upstream {
            status: Some(502),
            message: "bad gateway".into(),
            retriable: true,
        });
        assert_eq!(upstream.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_store_conflict_mapping() {
        let err = AppError::from(StoreError::Conflict("email taken".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
