use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelbase::config;
use reelbase::database::manager::DatabaseManager;
use reelbase::error::ApiError;
use reelbase::handlers;
use reelbase::middleware::{optional_auth, require_admin, require_auth};
use reelbase::tasks;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelbase=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::config();
    tracing::info!("Starting in {} mode", config.environment);

    // Sweep orphaned temp uploads in the background
    tokio::spawn(tasks::run_temp_cleanup());

    let app = build_router();

    let port = std::env::var("REELBASE_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app)
        .await
        .expect("Server error");
}

fn build_router() -> Router {
    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh_access))
        .route("/movie/recent", get(handlers::movie::recent))
        .route("/movie/:id", get(handlers::movie::get_one))
        .route("/director", get(handlers::director::list))
        .route("/director/:id", get(handlers::director::get_one))
        .route("/genre", get(handlers::genre::list))
        .route("/genre/:id", get(handlers::genre::get_one));

    // The movie list works anonymously but annotates rows for callers with
    // a valid access token.
    let movie_list = Router::new()
        .route("/movie", get(handlers::movie::list))
        .route_layer(from_fn(optional_auth));

    let protected_routes = Router::new()
        .route("/auth/whoami", get(handlers::auth::whoami))
        .route("/movie/:id/like", post(handlers::movie::like))
        .route("/movie/:id/dislike", post(handlers::movie::dislike))
        .route("/common/video", post(handlers::upload::upload_video))
        .route_layer(from_fn(require_auth));

    let admin_routes = Router::new()
        .route("/movie", post(handlers::movie::create))
        .route("/movie/:id", patch(handlers::movie::update))
        .route("/movie/:id", delete(handlers::movie::remove))
        .route("/director", post(handlers::director::create))
        .route("/director/:id", patch(handlers::director::update))
        .route("/director/:id", delete(handlers::director::remove))
        .route("/genre", post(handlers::genre::create))
        .route("/genre/:id", patch(handlers::genre::update))
        .route("/genre/:id", delete(handlers::genre::remove))
        .route_layer(from_fn(require_admin));

    // Multipart uploads need headroom over the configured file cap
    let body_limit = config::config().upload.max_file_size_bytes + 1024 * 1024;

    Router::new()
        .merge(public_routes)
        .merge(movie_list)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn root_handler() -> Json<Value> {
    Json(json!({
        "name": "reelbase",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Movie catalog API with cursor pagination"
    }))
}

async fn health_handler() -> Result<Json<Value>, ApiError> {
    DatabaseManager::health_check().await?;
    Ok(Json(json!({ "status": "healthy" })))
}
