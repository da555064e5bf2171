use serde::Serialize;

/// Per-user like/dislike marker for one movie. Composite primary key
/// (movie_id, user_id); a missing row means "no opinion".
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovieUserLike {
    pub movie_id: i64,
    pub user_id: i64,
    pub is_like: bool,
}
