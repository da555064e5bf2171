// JWT authentication middleware
use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{self, TokenType};
use crate::database::models::user::Role;
use crate::error::ApiError;

/// Authenticated caller, injected into request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// Caller identity when authentication is optional. `None` means the request
/// carried no Authorization header.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<AuthUser>);

fn authenticate(raw_header: &str) -> Result<AuthUser, ApiError> {
    let token = auth::extract_bearer(raw_header)?;
    let claims = auth::verify_token(&token, TokenType::Access)?;
    Ok(AuthUser {
        id: claims.sub,
        role: claims.role,
    })
}

/// Reject requests without a valid Bearer access token.
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(raw_header) = header else {
        return ApiError::unauthorized("Missing Authorization header").into_response();
    };

    match authenticate(raw_header) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Like [`require_auth`], but also rejects non-admin callers.
pub async fn require_admin(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(raw_header) = header else {
        return ApiError::unauthorized("Missing Authorization header").into_response();
    };

    match authenticate(raw_header) {
        Ok(user) if user.role == Role::Admin => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(_) => ApiError::forbidden("Admin access required").into_response(),
        Err(err) => err.into_response(),
    }
}

/// Attach caller identity when present, without requiring it. An invalid
/// token is still rejected so clients notice expired credentials.
pub async fn optional_auth(mut request: Request, next: Next) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let user = match header {
        Some(raw_header) => match authenticate(&raw_header) {
            Ok(user) => Some(user),
            Err(err) => return err.into_response(),
        },
        None => None,
    };

    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}
