// src/error.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Unavailable(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    /// Postgres SQLSTATE of a failed statement, if any.
    fn sql_state(&self) -> Option<String> {
        match self {
            AppError::Database(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) => match self.sql_state().as_deref() {
                Some("23505") => StatusCode::CONFLICT,
                Some("23503") | Some("23514") => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            AppError::Database(sqlx::Error::RowNotFound) => "Not found".to_string(),
            AppError::Database(e) => match status {
                StatusCode::CONFLICT => "Resource already exists".to_string(),
                StatusCode::BAD_REQUEST => "Request references invalid data".to_string(),
                _ => {
                    tracing::error!("Database error: {}", e);
                    "Internal server error".to_string()
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn not_found_names_the_resource() {
        let (status, body) = body_of(AppError::NotFound("Article")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Article not found");
    }

    #[actix_web::test]
    async fn validation_maps_to_bad_request() {
        let (status, body) = body_of(AppError::validation("email is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email is required");
    }

    #[actix_web::test]
    async fn internal_details_are_hidden() {
        let (status, body) = body_of(AppError::internal("cdn exploded")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn row_not_found_is_a_404() {
        let (status, _) = body_of(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn auth_errors_have_expected_status() {
        assert_eq!(
            AppError::Unauthorized("Unauthorized").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("Admin access required").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Unavailable("File storage is not configured").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
