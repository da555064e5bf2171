// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::database::paged::PagedQueryError;
use crate::pagination::PaginationError;
use crate::services::auth_service::AuthServiceError;
use crate::services::director_service::DirectorError;
use crate::services::genre_service::GenreError;
use crate::services::movie_service::MovieError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Pagination failures are always the caller's fault except for internal
// serialization problems.
impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::JsonError(e) => {
                tracing::error!("Cursor serialization error: {}", e);
                ApiError::internal_server_error("Failed to build pagination cursor")
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<PagedQueryError> for ApiError {
    fn from(err: PagedQueryError) -> Self {
        match err {
            PagedQueryError::Pagination(e) => e.into(),
            PagedQueryError::Sqlx(e) => {
                tracing::error!("Paged query error: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(e) => {
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidTokenFormat(msg) => ApiError::bad_request(msg),
            AuthError::InvalidToken | AuthError::WrongTokenType { .. } => {
                ApiError::unauthorized(err.to_string())
            }
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::MissingSecret | AuthError::TokenGeneration(_) => {
                tracing::error!("Token error: {}", err);
                ApiError::internal_server_error("Authentication is misconfigured")
            }
        }
    }
}

impl From<MovieError> for ApiError {
    fn from(err: MovieError) -> Self {
        match err {
            MovieError::Pagination(e) => e.into(),
            MovieError::Paged(e) => e.into(),
            MovieError::Database(e) => e.into(),
            MovieError::Sqlx(e) => {
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Database error occurred")
            }
            MovieError::NotFound(_) | MovieError::DirectorNotFound(_) => {
                ApiError::not_found(err.to_string())
            }
            MovieError::GenresNotFound(_) => ApiError::not_found(err.to_string()),
            MovieError::Io(e) => {
                tracing::error!("Movie file error: {}", e);
                ApiError::internal_server_error("Failed to store the movie file")
            }
            MovieError::Json(e) => {
                tracing::error!("JSON serialization error: {}", e);
                ApiError::internal_server_error("Failed to format response")
            }
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::Auth(e) => e.into(),
            AuthServiceError::Database(e) => e.into(),
            AuthServiceError::Sqlx(e) => {
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Database error occurred")
            }
            AuthServiceError::EmailTaken(_) => ApiError::conflict(err.to_string()),
            AuthServiceError::InvalidLogin => ApiError::unauthorized(err.to_string()),
            AuthServiceError::UserNotFound(_) => ApiError::not_found(err.to_string()),
        }
    }
}

impl From<DirectorError> for ApiError {
    fn from(err: DirectorError) -> Self {
        match err {
            DirectorError::Database(e) => e.into(),
            DirectorError::Sqlx(e) => {
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Database error occurred")
            }
            DirectorError::NotFound(_) => ApiError::not_found(err.to_string()),
        }
    }
}

impl From<GenreError> for ApiError {
    fn from(err: GenreError) -> Self {
        match err {
            GenreError::Database(e) => e.into(),
            GenreError::Sqlx(e) => {
                tracing::error!("SQLx error: {}", e);
                ApiError::internal_server_error("Database error occurred")
            }
            GenreError::NotFound(_) => ApiError::not_found(err.to_string()),
            GenreError::Duplicate(_) => ApiError::conflict(err.to_string()),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_errors_map_to_bad_request() {
        let err: ApiError = PaginationError::MalformedCursor("bad base64".to_string()).into();
        assert_eq!(err.status_code(), 400);

        let err: ApiError = PaginationError::CursorOrderMismatch {
            cursor_order: "title_ASC".to_string(),
            request_order: "id_DESC".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), 400);

        let err: ApiError = PaginationError::InvalidOrderSpec("empty".to_string()).into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn json_body_shape() {
        let err = ApiError::not_found("Movie not found: 3");
        let body = err.to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Movie not found: 3");
    }
}
