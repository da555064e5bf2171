// Movie endpoints, including the cursor-paginated list
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::config;
use crate::error::ApiError;
use crate::middleware::{AuthUser, MaybeUser};
use crate::services::movie_service::{CreateMovie, ListMoviesParams, MovieService, UpdateMovie};

#[derive(Debug, Deserialize)]
pub struct ListMoviesQuery {
    pub title: Option<String>,
    /// Comma-separated `column_DIRECTION` entries, e.g. `title_ASC,id_DESC`
    pub order: Option<String>,
    pub take: Option<i64>,
    pub cursor: Option<String>,
}

impl ListMoviesQuery {
    fn into_params(self) -> ListMoviesParams {
        let pagination = &config::config().pagination;

        let order = match self.order.as_deref().filter(|o| !o.is_empty()) {
            Some(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
            None => vec!["id_DESC".to_string()],
        };

        let take = self
            .take
            .unwrap_or(pagination.default_take)
            .min(pagination.max_take);

        ListMoviesParams {
            title: self.title,
            order,
            take,
            cursor: self.cursor,
        }
    }
}

/// GET /movie - filtered, cursor-paginated list. Authenticated callers get
/// per-row like annotations.
pub async fn list(
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    Query(query): Query<ListMoviesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = MovieService::new().await?;
    let page = service
        .find_all(query.into_params(), user.map(|u| u.id))
        .await?;
    Ok(Json(page))
}

/// GET /movie/recent - the 10 newest movies, cached
pub async fn recent() -> Result<impl IntoResponse, ApiError> {
    let service = MovieService::new().await?;
    let movies = service.find_recent().await?;
    Ok(Json(movies))
}

/// GET /movie/:id
pub async fn get_one(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = MovieService::new().await?;
    let movie = service.find_one(id).await?;
    Ok(Json(movie))
}

/// POST /movie (admin)
pub async fn create(Json(dto): Json<CreateMovie>) -> Result<impl IntoResponse, ApiError> {
    let service = MovieService::new().await?;
    let movie = service.create(dto).await?;

    tracing::info!("Created movie {}", movie.id);
    Ok((StatusCode::CREATED, Json(movie)))
}

/// PATCH /movie/:id (admin)
pub async fn update(
    Path(id): Path<i64>,
    Json(dto): Json<UpdateMovie>,
) -> Result<impl IntoResponse, ApiError> {
    let service = MovieService::new().await?;
    let movie = service.update(id, dto).await?;
    Ok(Json(movie))
}

/// DELETE /movie/:id (admin)
pub async fn remove(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = MovieService::new().await?;
    let id = service.remove(id).await?;

    tracing::info!("Deleted movie {}", id);
    Ok(Json(json!(id)))
}

/// POST /movie/:id/like
pub async fn like(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(id, user.id, true).await
}

/// POST /movie/:id/dislike
pub async fn dislike(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(id, user.id, false).await
}

async fn toggle(movie_id: i64, user_id: i64, is_like: bool) -> Result<Json<serde_json::Value>, ApiError> {
    let service = MovieService::new().await?;
    let status = service.toggle_like(movie_id, user_id, is_like).await?;
    Ok(Json(json!({ "isLike": status })))
}
