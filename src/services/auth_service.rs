use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::{self, AuthError, TokenType};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::{Role, User};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid login credentials")]
    InvalidLogin,

    #[error("User not found: {0}")]
    UserNotFound(i64),
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub async fn new() -> Result<Self, AuthServiceError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user from a Basic Authorization header. New accounts
    /// get the default role.
    pub async fn register(&self, raw_header: &str) -> Result<User, AuthServiceError> {
        let (email, password) = auth::parse_basic_credentials(raw_header)?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT \"id\" FROM \"users\" WHERE \"email\" = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(AuthServiceError::EmailTaken(email));
        }

        let user: User = sqlx::query_as(
            "INSERT INTO \"users\" (\"email\", \"password\", \"role\") VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(&email)
        .bind(auth::hash_password(&password))
        .bind(Role::User)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Authenticate a Basic Authorization header and issue an access plus
    /// refresh token pair.
    pub async fn login(&self, raw_header: &str) -> Result<TokenPair, AuthServiceError> {
        let (email, password) = auth::parse_basic_credentials(raw_header)?;
        let user = self.authenticate(&email, &password).await?;

        Ok(TokenPair {
            access_token: auth::issue_token(user.id, user.role, TokenType::Access)?,
            refresh_token: auth::issue_token(user.id, user.role, TokenType::Refresh)?,
        })
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthServiceError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM \"users\" WHERE \"email\" = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        // Same error for unknown email and wrong password
        let user = user.ok_or(AuthServiceError::InvalidLogin)?;
        if !auth::verify_password(password, &user.password) {
            return Err(AuthServiceError::InvalidLogin);
        }
        Ok(user)
    }

    /// Exchange a valid refresh token for a fresh access token. The user is
    /// re-read so a role change takes effect on rotation.
    pub async fn rotate_access_token(&self, raw_header: &str) -> Result<String, AuthServiceError> {
        let token = auth::extract_bearer(raw_header)?;
        let claims = auth::verify_token(&token, TokenType::Refresh)?;
        let user = self.find_user(claims.sub).await?;
        Ok(auth::issue_token(user.id, user.role, TokenType::Access)?)
    }

    pub async fn find_user(&self, id: i64) -> Result<User, AuthServiceError> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM \"users\" WHERE \"id\" = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        user.ok_or(AuthServiceError::UserNotFound(id))
    }
}
