use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::types::Json;

use super::director::Director;
use super::genre::Genre;

/// A movie row with its director and genres resolved by the joined row
/// source every movie read selects from. `like_status` is never read from
/// the database: it is attached transiently per request for the caller that
/// is logged in, and omitted from the JSON entirely otherwise.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub detail: Option<String>,
    pub movie_file_path: Option<String>,
    pub director: Json<Option<Director>>,
    pub genres: Json<Vec<Genre>>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
    #[sqlx(skip)]
    #[serde(rename = "likeStatus", skip_serializing_if = "Option::is_none")]
    pub like_status: Option<Option<bool>>,
}
