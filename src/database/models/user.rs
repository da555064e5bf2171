use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// User roles, ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[repr(i32)]
pub enum Role {
    Admin = 0,
    PaidUser = 1,
    User = 2,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Salted hash; never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}
