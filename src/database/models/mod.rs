pub mod director;
pub mod genre;
pub mod like;
pub mod movie;
pub mod user;
