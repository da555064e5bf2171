// Multipart video upload endpoint
use axum::{extract::Multipart, response::IntoResponse, Json};
use serde_json::json;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

const VIDEO_FIELD: &str = "video";
const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// POST /common/video - accept an mp4 upload into the temp folder and return
/// the generated file name. The file is claimed by a later movie create;
/// unclaimed files are swept by the cleanup task.
pub async fn upload_video(mut multipart: Multipart) -> Result<impl IntoResponse, ApiError> {
    let upload = &config::config().upload;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        if field.content_type() != Some(VIDEO_CONTENT_TYPE) {
            return Err(ApiError::bad_request("Only video/mp4 uploads are accepted"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        if bytes.len() > upload.max_file_size_bytes {
            return Err(ApiError::bad_request(format!(
                "Upload exceeds the {} byte limit",
                upload.max_file_size_bytes
            )));
        }

        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let file_name = format!("{}_{}.mp4", Uuid::new_v4().simple(), epoch_ms);

        let temp_dir = Path::new(&upload.dir).join("temp");
        tokio::fs::create_dir_all(&temp_dir).await.map_err(|e| {
            tracing::error!("Failed to create temp upload dir: {}", e);
            ApiError::internal_server_error("Failed to store upload")
        })?;
        tokio::fs::write(temp_dir.join(&file_name), &bytes)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write upload: {}", e);
                ApiError::internal_server_error("Failed to store upload")
            })?;

        tracing::info!("Stored upload {} ({} bytes)", file_name, bytes.len());
        return Ok(Json(json!({ "fileName": file_name })));
    }

    Err(ApiError::bad_request("Missing 'video' multipart field"))
}
