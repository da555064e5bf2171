use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::genre::Genre;

#[derive(Debug, Error)]
pub enum GenreError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Genre not found: {0}")]
    NotFound(i64),

    #[error("Genre already exists: {0}")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
pub struct CreateGenre {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGenre {
    pub name: String,
}

pub struct GenreService {
    pool: PgPool,
}

impl GenreService {
    pub async fn new() -> Result<Self, GenreError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Genre>, GenreError> {
        let genres = sqlx::query_as("SELECT * FROM \"genre\" ORDER BY \"id\"")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    pub async fn find_one(&self, id: i64) -> Result<Genre, GenreError> {
        let genre: Option<Genre> = sqlx::query_as("SELECT * FROM \"genre\" WHERE \"id\" = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        genre.ok_or(GenreError::NotFound(id))
    }

    pub async fn create(&self, dto: CreateGenre) -> Result<Genre, GenreError> {
        self.ensure_name_free(&dto.name).await?;

        let genre = sqlx::query_as("INSERT INTO \"genre\" (\"name\") VALUES ($1) RETURNING *")
            .bind(&dto.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(genre)
    }

    pub async fn update(&self, id: i64, dto: UpdateGenre) -> Result<Genre, GenreError> {
        self.ensure_name_free(&dto.name).await?;

        let genre: Option<Genre> = sqlx::query_as(
            "UPDATE \"genre\" SET \"name\" = $2, \"updated_at\" = now(), \
             \"version\" = \"version\" + 1 WHERE \"id\" = $1 RETURNING *",
        )
        .bind(id)
        .bind(&dto.name)
        .fetch_optional(&self.pool)
        .await?;
        genre.ok_or(GenreError::NotFound(id))
    }

    pub async fn remove(&self, id: i64) -> Result<i64, GenreError> {
        let result = sqlx::query("DELETE FROM \"genre\" WHERE \"id\" = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(GenreError::NotFound(id));
        }
        Ok(id)
    }

    async fn ensure_name_free(&self, name: &str) -> Result<(), GenreError> {
        let existing: Option<(i64,)> = sqlx::query_as("SELECT \"id\" FROM \"genre\" WHERE \"name\" = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(GenreError::Duplicate(name.to_string()));
        }
        Ok(())
    }
}
