use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use derive_more::Display;

/// Domain error taxonomy for the leave lifecycle core.
///
/// Validation and Conflict are rejected before any write and are not
/// retryable without changed input. Store covers transient storage failures
/// (timeout, contention); the whole operation is safe to retry because
/// nothing was committed.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "temporary storage failure, please retry")]
    Store(sqlx::Error),
}

impl ApiError {
    pub fn retryable(&self) -> bool {
        matches!(self, ApiError::Store(_))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Store(err)
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Store(err) = self {
            tracing::error!(error = %err, "Storage failure");
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string(),
            "retryable": self.retryable(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad date".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("missing".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("overlap".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Store(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn only_store_errors_are_retryable() {
        assert!(ApiError::Store(sqlx::Error::PoolTimedOut).retryable());
        assert!(!ApiError::Conflict("overlap".into()).retryable());
        assert!(!ApiError::Validation("bad date".into()).retryable());
    }
}
