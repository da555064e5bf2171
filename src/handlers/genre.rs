// Genre CRUD endpoints (admin-gated at the router)
use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::genre_service::{CreateGenre, GenreService, UpdateGenre};

pub async fn list() -> Result<impl IntoResponse, ApiError> {
    let service = GenreService::new().await?;
    Ok(Json(service.find_all().await?))
}

pub async fn get_one(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = GenreService::new().await?;
    Ok(Json(service.find_one(id).await?))
}

pub async fn create(Json(dto): Json<CreateGenre>) -> Result<impl IntoResponse, ApiError> {
    let service = GenreService::new().await?;
    let genre = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn update(
    Path(id): Path<i64>,
    Json(dto): Json<UpdateGenre>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GenreService::new().await?;
    Ok(Json(service.update(id, dto).await?))
}

pub async fn remove(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = GenreService::new().await?;
    let id = service.remove(id).await?;
    Ok(Json(json!(id)))
}
