// Director CRUD endpoints (admin-gated at the router)
use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::ApiError;
use crate::services::director_service::{CreateDirector, DirectorService, UpdateDirector};

pub async fn list() -> Result<impl IntoResponse, ApiError> {
    let service = DirectorService::new().await?;
    Ok(Json(service.find_all().await?))
}

pub async fn get_one(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = DirectorService::new().await?;
    Ok(Json(service.find_one(id).await?))
}

pub async fn create(Json(dto): Json<CreateDirector>) -> Result<impl IntoResponse, ApiError> {
    let service = DirectorService::new().await?;
    let director = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

pub async fn update(
    Path(id): Path<i64>,
    Json(dto): Json<UpdateDirector>,
) -> Result<impl IntoResponse, ApiError> {
    let service = DirectorService::new().await?;
    Ok(Json(service.update(id, dto).await?))
}

pub async fn remove(Path(id): Path<i64>) -> Result<impl IntoResponse, ApiError> {
    let service = DirectorService::new().await?;
    let id = service.remove(id).await?;
    Ok(Json(json!(id)))
}
