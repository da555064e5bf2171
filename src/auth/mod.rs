use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims carried by both access and refresh tokens. The `type` claim
/// keeps a refresh token from being replayed as an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Expected a {expected:?} token")]
    WrongTokenType { expected: TokenType },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token secret not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),
}

fn secret_for(token_type: TokenType) -> Result<&'static str, AuthError> {
    let security = &config::config().security;
    let secret = match token_type {
        TokenType::Access => security.access_token_secret.as_str(),
        TokenType::Refresh => security.refresh_token_secret.as_str(),
    };
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret)
}

pub fn issue_token(user_id: i64, role: Role, token_type: TokenType) -> Result<String, AuthError> {
    let security = &config::config().security;
    let ttl = match token_type {
        TokenType::Access => Duration::seconds(security.access_token_expiry_secs as i64),
        TokenType::Refresh => Duration::hours(security.refresh_token_expiry_hours as i64),
    };
    sign_token(user_id, role, token_type, ttl, secret_for(token_type)?)
}

pub fn verify_token(token: &str, token_type: TokenType) -> Result<Claims, AuthError> {
    verify_token_with(token, token_type, secret_for(token_type)?)
}

fn sign_token(
    user_id: i64,
    role: Role,
    token_type: TokenType,
    ttl: Duration,
    secret: &str,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        token_type,
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

fn verify_token_with(
    token: &str,
    token_type: TokenType,
    secret: &str,
) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::InvalidToken)?;

    if data.claims.token_type != token_type {
        return Err(AuthError::WrongTokenType {
            expected: token_type,
        });
    }
    Ok(data.claims)
}

/// Parse an HTTP Basic Authorization header: `Basic base64(email:password)`.
pub fn parse_basic_credentials(raw_header: &str) -> Result<(String, String), AuthError> {
    let (scheme, token) = raw_header
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidTokenFormat("expected '<scheme> <token>'".to_string()))?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::InvalidTokenFormat(
            "expected Basic authorization scheme".to_string(),
        ));
    }

    let decoded = BASE64
        .decode(token.trim().as_bytes())
        .map_err(|_| AuthError::InvalidTokenFormat("credentials are not valid base64".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AuthError::InvalidTokenFormat("credentials are not valid UTF-8".to_string()))?;

    let (email, password) = decoded
        .split_once(':')
        .ok_or_else(|| AuthError::InvalidTokenFormat("expected email:password".to_string()))?;

    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidTokenFormat(
            "email and password must be non-empty".to_string(),
        ));
    }

    Ok((email.to_string(), password.to_string()))
}

/// Extract the token from a `Bearer <token>` Authorization header.
pub fn extract_bearer(raw_header: &str) -> Result<String, AuthError> {
    let token = raw_header
        .strip_prefix("Bearer ")
        .or_else(|| raw_header.strip_prefix("bearer "))
        .ok_or_else(|| {
            AuthError::InvalidTokenFormat("expected Bearer authorization scheme".to_string())
        })?;
    if token.trim().is_empty() {
        return Err(AuthError::InvalidTokenFormat("empty bearer token".to_string()));
    }
    Ok(token.trim().to_string())
}

/// Salted SHA-256 password hash, stored as `<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = sign_token(7, Role::User, TokenType::Access, Duration::minutes(5), "secret")
            .unwrap();
        let claims = verify_token_with(&token, TokenType::Access, "secret").unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let token = sign_token(7, Role::User, TokenType::Refresh, Duration::hours(1), "secret")
            .unwrap();
        let err = verify_token_with(&token, TokenType::Access, "secret").unwrap_err();
        assert!(matches!(
            err,
            AuthError::WrongTokenType {
                expected: TokenType::Access
            }
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign_token(7, Role::Admin, TokenType::Access, Duration::minutes(5), "secret")
            .unwrap();
        let err = verify_token_with(&token, TokenType::Access, "other").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn parses_basic_credentials() {
        let header = format!("Basic {}", BASE64.encode(b"user@example.com:pass123"));
        let (email, password) = parse_basic_credentials(&header).unwrap();
        assert_eq!(email, "user@example.com");
        assert_eq!(password, "pass123");
    }

    #[test]
    fn rejects_bearer_scheme_for_basic() {
        let err = parse_basic_credentials("Bearer abc").unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenFormat(_)));
    }

    #[test]
    fn rejects_credentials_without_separator() {
        let header = format!("Basic {}", BASE64.encode(b"no-colon-here"));
        let err = parse_basic_credentials(&header).unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenFormat(_)));
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer("Bearer abc.def").unwrap(), "abc.def");
        assert!(extract_bearer("Basic abc").is_err());
        assert!(extract_bearer("Bearer ").is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn password_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }
}
