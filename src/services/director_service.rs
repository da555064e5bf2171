use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::director::Director;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Director not found: {0}")]
    NotFound(i64),
}

#[derive(Debug, Deserialize)]
pub struct CreateDirector {
    pub name: String,
    pub dob: NaiveDate,
    pub nationality: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDirector {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub nationality: Option<String>,
}

pub struct DirectorService {
    pool: PgPool,
}

impl DirectorService {
    pub async fn new() -> Result<Self, DirectorError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Director>, DirectorError> {
        let directors = sqlx::query_as("SELECT * FROM \"director\" ORDER BY \"id\"")
            .fetch_all(&self.pool)
            .await?;
        Ok(directors)
    }

    pub async fn find_one(&self, id: i64) -> Result<Director, DirectorError> {
        let director: Option<Director> =
            sqlx::query_as("SELECT * FROM \"director\" WHERE \"id\" = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        director.ok_or(DirectorError::NotFound(id))
    }

    pub async fn create(&self, dto: CreateDirector) -> Result<Director, DirectorError> {
        let director = sqlx::query_as(
            "INSERT INTO \"director\" (\"name\", \"dob\", \"nationality\") \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&dto.name)
        .bind(dto.dob)
        .bind(&dto.nationality)
        .fetch_one(&self.pool)
        .await?;
        Ok(director)
    }

    pub async fn update(&self, id: i64, dto: UpdateDirector) -> Result<Director, DirectorError> {
        let director: Option<Director> = sqlx::query_as(
            "UPDATE \"director\" SET \
                \"name\" = COALESCE($2, \"name\"), \
                \"dob\" = COALESCE($3, \"dob\"), \
                \"nationality\" = COALESCE($4, \"nationality\"), \
                \"updated_at\" = now(), \
                \"version\" = \"version\" + 1 \
             WHERE \"id\" = $1 RETURNING *",
        )
        .bind(id)
        .bind(&dto.name)
        .bind(dto.dob)
        .bind(&dto.nationality)
        .fetch_optional(&self.pool)
        .await?;
        director.ok_or(DirectorError::NotFound(id))
    }

    pub async fn remove(&self, id: i64) -> Result<i64, DirectorError> {
        let result = sqlx::query("DELETE FROM \"director\" WHERE \"id\" = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DirectorError::NotFound(id));
        }
        Ok(id)
    }
}
