use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::cache::CacheStore;
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::genre::Genre;
use crate::database::models::like::MovieUserLike;
use crate::database::models::movie::Movie;
use crate::database::paged::{fetch_page, Page, PagedQueryError};
use crate::pagination::{OrderSpec, PageQuery, PaginationError};

const RECENT_MOVIES_CACHE_KEY: &str = "MOVIE_RECENT";
const RECENT_MOVIES_TAKE: i64 = 10;

/// Movie row source with director and genres resolved, used by every list
/// and detail read. Ordering and seek predicates apply to the columns of
/// this derived table.
const MOVIE_SOURCE: &str = r#"(
    SELECT m."id", m."title", m."detail", m."movie_file_path",
           to_jsonb(d.*) AS "director",
           COALESCE(jsonb_agg(g.* ORDER BY g."id") FILTER (WHERE g."id" IS NOT NULL), '[]'::jsonb) AS "genres",
           m."created_at", m."updated_at", m."version"
    FROM "movie" m
    LEFT JOIN "director" d ON d."id" = m."director_id"
    LEFT JOIN "movie_genre" mg ON mg."movie_id" = m."id"
    LEFT JOIN "genre" g ON g."id" = mg."genre_id"
    GROUP BY m."id", d."id"
) AS "movie""#;

#[derive(Debug, Error)]
pub enum MovieError {
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Paged(#[from] PagedQueryError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Movie not found: {0}")]
    NotFound(i64),

    #[error("Director not found: {0}")]
    DirectorNotFound(i64),

    #[error("Unknown genre ids; existing ids: {0}")]
    GenresNotFound(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validated list-request parameters; defaults and the take ceiling are the
/// HTTP layer's concern.
#[derive(Debug, Clone)]
pub struct ListMoviesParams {
    pub title: Option<String>,
    pub order: Vec<String>,
    pub take: i64,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovie {
    pub title: String,
    pub detail: Option<String>,
    #[serde(rename = "directorId")]
    pub director_id: i64,
    #[serde(rename = "genreIds")]
    pub genre_ids: Vec<i64>,
    #[serde(rename = "movieFileName")]
    pub movie_file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub detail: Option<String>,
    #[serde(rename = "directorId")]
    pub director_id: Option<i64>,
    #[serde(rename = "genreIds")]
    pub genre_ids: Option<Vec<i64>>,
}

pub struct MovieService {
    pool: PgPool,
}

impl MovieService {
    pub async fn new() -> Result<Self, MovieError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cursor-paginated, title-filtered movie list. When a user id is
    /// present, each returned row is annotated with that user's tri-state
    /// like status; anonymous requests get rows without the field.
    pub async fn find_all(
        &self,
        params: ListMoviesParams,
        user_id: Option<i64>,
    ) -> Result<Page<Movie>, MovieError> {
        let order = OrderSpec::parse(&params.order)?;

        let mut query = PageQuery::new(MOVIE_SOURCE, order)
            .take(params.take)?
            .cursor(params.cursor);

        if let Some(title) = params.title.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter("\"title\" ILIKE $1", vec![json!(format!("%{}%", title))]);
        }

        let mut page = fetch_page::<Movie>(&self.pool, &query).await?;

        if let Some(user_id) = user_id {
            let movie_ids: Vec<i64> = page.data.iter().map(|m| m.id).collect();
            // Skip the like query entirely for an empty page
            let likes = if movie_ids.is_empty() {
                HashMap::new()
            } else {
                self.fetch_like_map(&movie_ids, user_id).await?
            };
            merge_like_status(&mut page.data, &likes);
        }

        Ok(page)
    }

    async fn fetch_like_map(
        &self,
        movie_ids: &[i64],
        user_id: i64,
    ) -> Result<HashMap<i64, bool>, MovieError> {
        let records: Vec<MovieUserLike> = sqlx::query_as(
            "SELECT \"movie_id\", \"user_id\", \"is_like\" FROM \"movie_user_like\" \
             WHERE \"movie_id\" = ANY($1) AND \"user_id\" = $2",
        )
        .bind(movie_ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(|r| (r.movie_id, r.is_like)).collect())
    }

    /// The 10 most recently created movies, served from the process cache
    /// within its expiry window. Writes do not invalidate the entry; the
    /// staleness window is bounded by the TTL.
    pub async fn find_recent(&self) -> Result<Value, MovieError> {
        let cache = CacheStore::instance();
        if let Some(cached) = cache.get(RECENT_MOVIES_CACHE_KEY).await {
            return Ok(cached);
        }

        let movies: Vec<Movie> = sqlx::query_as(&format!(
            "SELECT * FROM {} ORDER BY \"created_at\" DESC LIMIT {}",
            MOVIE_SOURCE, RECENT_MOVIES_TAKE
        ))
        .fetch_all(&self.pool)
        .await?;

        let value = serde_json::to_value(&movies)?;
        cache
            .set(
                RECENT_MOVIES_CACHE_KEY,
                value.clone(),
                config::config().cache.recent_movies_ttl_ms,
            )
            .await;
        Ok(value)
    }

    pub async fn find_one(&self, id: i64) -> Result<Movie, MovieError> {
        let movie: Option<Movie> =
            sqlx::query_as(&format!("SELECT * FROM {} WHERE \"id\" = $1", MOVIE_SOURCE))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        movie.ok_or(MovieError::NotFound(id))
    }

    /// Create a movie, its genre relations and commit the uploaded file.
    /// Director and all genres must exist; everything runs in one
    /// transaction, and the temp upload is moved into the movie folder only
    /// after the commit succeeds.
    pub async fn create(&self, dto: CreateMovie) -> Result<Movie, MovieError> {
        let mut tx = self.pool.begin().await?;

        let director: Option<(i64,)> = sqlx::query_as("SELECT \"id\" FROM \"director\" WHERE \"id\" = $1")
            .bind(dto.director_id)
            .fetch_optional(&mut *tx)
            .await?;
        if director.is_none() {
            return Err(MovieError::DirectorNotFound(dto.director_id));
        }

        let genres = self.require_genres(&mut tx, &dto.genre_ids).await?;

        let upload = &config::config().upload;
        let movie_file_path = Path::new(&upload.dir)
            .join("movie")
            .join(&dto.movie_file_name)
            .to_string_lossy()
            .into_owned();

        let (movie_id,): (i64,) = sqlx::query_as(
            "INSERT INTO \"movie\" (\"title\", \"detail\", \"director_id\", \"movie_file_path\") \
             VALUES ($1, $2, $3, $4) RETURNING \"id\"",
        )
        .bind(&dto.title)
        .bind(&dto.detail)
        .bind(dto.director_id)
        .bind(&movie_file_path)
        .fetch_one(&mut *tx)
        .await?;

        for genre in &genres {
            sqlx::query("INSERT INTO \"movie_genre\" (\"movie_id\", \"genre_id\") VALUES ($1, $2)")
                .bind(movie_id)
                .bind(genre.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        // Move the uploaded file from the temp folder into its final home
        let temp_path = Path::new(&upload.dir).join("temp").join(&dto.movie_file_name);
        tokio::fs::rename(&temp_path, Path::new(&movie_file_path)).await?;

        self.find_one(movie_id).await
    }

    pub async fn update(&self, id: i64, dto: UpdateMovie) -> Result<Movie, MovieError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as("SELECT \"id\" FROM \"movie\" WHERE \"id\" = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(MovieError::NotFound(id));
        }

        if let Some(director_id) = dto.director_id {
            let director: Option<(i64,)> =
                sqlx::query_as("SELECT \"id\" FROM \"director\" WHERE \"id\" = $1")
                    .bind(director_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if director.is_none() {
                return Err(MovieError::DirectorNotFound(director_id));
            }
        }

        sqlx::query(
            "UPDATE \"movie\" SET \
                \"title\" = COALESCE($2, \"title\"), \
                \"detail\" = COALESCE($3, \"detail\"), \
                \"director_id\" = COALESCE($4, \"director_id\"), \
                \"updated_at\" = now(), \
                \"version\" = \"version\" + 1 \
             WHERE \"id\" = $1",
        )
        .bind(id)
        .bind(&dto.title)
        .bind(&dto.detail)
        .bind(dto.director_id)
        .execute(&mut *tx)
        .await?;

        if let Some(genre_ids) = &dto.genre_ids {
            let genres = self.require_genres(&mut tx, genre_ids).await?;
            sqlx::query("DELETE FROM \"movie_genre\" WHERE \"movie_id\" = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for genre in &genres {
                sqlx::query("INSERT INTO \"movie_genre\" (\"movie_id\", \"genre_id\") VALUES ($1, $2)")
                    .bind(id)
                    .bind(genre.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        self.find_one(id).await
    }

    pub async fn remove(&self, id: i64) -> Result<i64, MovieError> {
        let result = sqlx::query("DELETE FROM \"movie\" WHERE \"id\" = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MovieError::NotFound(id));
        }
        Ok(id)
    }

    /// Toggle a like/dislike: repeating the same reaction removes the
    /// record, the opposite reaction flips it, no record creates one.
    /// Returns the resulting tri-state.
    pub async fn toggle_like(
        &self,
        movie_id: i64,
        user_id: i64,
        is_like: bool,
    ) -> Result<Option<bool>, MovieError> {
        let movie: Option<(i64,)> = sqlx::query_as("SELECT \"id\" FROM \"movie\" WHERE \"id\" = $1")
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        if movie.is_none() {
            return Err(MovieError::NotFound(movie_id));
        }

        let existing: Option<MovieUserLike> = sqlx::query_as(
            "SELECT \"movie_id\", \"user_id\", \"is_like\" FROM \"movie_user_like\" \
             WHERE \"movie_id\" = $1 AND \"user_id\" = $2",
        )
        .bind(movie_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(record) if record.is_like == is_like => {
                sqlx::query(
                    "DELETE FROM \"movie_user_like\" WHERE \"movie_id\" = $1 AND \"user_id\" = $2",
                )
                .bind(movie_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
                Ok(None)
            }
            Some(_) => {
                sqlx::query(
                    "UPDATE \"movie_user_like\" SET \"is_like\" = $3 \
                     WHERE \"movie_id\" = $1 AND \"user_id\" = $2",
                )
                .bind(movie_id)
                .bind(user_id)
                .bind(is_like)
                .execute(&self.pool)
                .await?;
                Ok(Some(is_like))
            }
            None => {
                sqlx::query(
                    "INSERT INTO \"movie_user_like\" (\"movie_id\", \"user_id\", \"is_like\") \
                     VALUES ($1, $2, $3)",
                )
                .bind(movie_id)
                .bind(user_id)
                .bind(is_like)
                .execute(&self.pool)
                .await?;
                Ok(Some(is_like))
            }
        }
    }

    async fn require_genres(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        genre_ids: &[i64],
    ) -> Result<Vec<Genre>, MovieError> {
        let genres: Vec<Genre> = sqlx::query_as("SELECT * FROM \"genre\" WHERE \"id\" = ANY($1)")
            .bind(genre_ids)
            .fetch_all(&mut **tx)
            .await?;

        if genres.len() != genre_ids.len() {
            let existing: Vec<String> = genres.iter().map(|g| g.id.to_string()).collect();
            return Err(MovieError::GenresNotFound(existing.join(", ")));
        }
        Ok(genres)
    }
}

/// Merge fetched like markers into the page rows: a present record becomes
/// `likeStatus: true/false`, a missing one `likeStatus: null`.
pub fn merge_like_status(movies: &mut [Movie], likes: &HashMap<i64, bool>) {
    for movie in movies {
        movie.like_status = Some(likes.get(&movie.id).copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use sqlx::types::Json;

    fn movie(id: i64) -> Movie {
        let ts = NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Movie {
            id,
            title: format!("movie {}", id),
            detail: None,
            movie_file_path: None,
            director: Json(None),
            genres: Json(vec![]),
            created_at: ts,
            updated_at: ts,
            version: 1,
            like_status: None,
        }
    }

    #[test]
    fn merge_sets_tri_state_in_row_order() {
        let mut rows = vec![movie(1), movie(2), movie(3)];
        let mut likes = HashMap::new();
        likes.insert(1, true);
        likes.insert(2, false);

        merge_like_status(&mut rows, &likes);

        assert_eq!(rows[0].like_status, Some(Some(true)));
        assert_eq!(rows[1].like_status, Some(Some(false)));
        assert_eq!(rows[2].like_status, Some(None));
    }

    #[test]
    fn annotated_rows_serialize_like_status() {
        let mut rows = vec![movie(1), movie(2)];
        let mut likes = HashMap::new();
        likes.insert(1, true);
        merge_like_status(&mut rows, &likes);

        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["likeStatus"], serde_json::json!(true));
        assert_eq!(json[1]["likeStatus"], serde_json::Value::Null);
        assert!(json[1].as_object().unwrap().contains_key("likeStatus"));
    }

    #[test]
    fn anonymous_rows_serialize_without_like_status() {
        let rows = vec![movie(1)];
        let json = serde_json::to_value(&rows).unwrap();
        assert!(!json[0].as_object().unwrap().contains_key("likeStatus"));
    }
}
