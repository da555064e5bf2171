// Authentication endpoints
use axum::{
    extract::Extension,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::auth_service::AuthService;

fn authorization_header(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))
}

/// POST /auth/register - create an account from Basic credentials
pub async fn register(headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    let raw_header = authorization_header(&headers)?;
    let service = AuthService::new().await?;
    let user = service.register(raw_header).await?;

    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login - exchange Basic credentials for a token pair
pub async fn login(headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    let raw_header = authorization_header(&headers)?;
    let service = AuthService::new().await?;
    let tokens = service.login(raw_header).await?;
    Ok(Json(tokens))
}

/// POST /auth/refresh - rotate a refresh token into a new access token
pub async fn refresh_access(headers: HeaderMap) -> Result<impl IntoResponse, ApiError> {
    let raw_header = authorization_header(&headers)?;
    let service = AuthService::new().await?;
    let access_token = service.rotate_access_token(raw_header).await?;
    Ok(Json(json!({ "accessToken": access_token })))
}

/// GET /auth/whoami - return the authenticated user's record
pub async fn whoami(Extension(user): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    let service = AuthService::new().await?;
    let user = service.find_user(user.id).await?;
    Ok(Json(user))
}
