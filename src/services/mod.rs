pub mod auth_service;
pub mod director_service;
pub mod genre_service;
pub mod movie_service;
