pub mod auth;
pub mod director;
pub mod genre;
pub mod movie;
pub mod upload;
