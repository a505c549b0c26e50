//! Habaru Media Backend
//!
//! REST backend for the Habaru Media content site: public reading experience
//! (posts, categories, newsletter signup, visit tracking) and a
//! password-protected admin area (authoring, analytics, subscriber
//! management) over SQLite persistence.

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod models;
mod prefs;
mod stats;
mod storage;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::SessionStore;
use cache::QueryCache;
use config::Config;
use db::Repository;
use prefs::PreferenceStore;
use storage::ImageStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub cache: QueryCache,
    pub sessions: SessionStore,
    pub images: ImageStore,
    pub prefs: Arc<PreferenceStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Habaru Media Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Uploads directory: {:?}", config.uploads_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the admin password is not configured
    if config.admin_password.is_none() {
        tracing::warn!("No admin password configured (HABARU_ADMIN_PASSWORD). Admin login is disabled!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize image storage and theme preferences
    let images = ImageStore::open(&config.uploads_dir).await?;
    let prefs = Arc::new(PreferenceStore::load(&config.prefs_path).await);

    // Create application state
    let state = AppState {
        repo,
        cache: QueryCache::new(),
        sessions: SessionStore::new(),
        images,
        prefs,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes
    let public_routes = Router::new()
        // Posts
        .route("/posts", get(api::list_posts))
        .route("/posts/{id}", get(api::get_post))
        .route("/categories", get(api::list_categories))
        // Newsletter + tracking
        .route("/subscribers", post(api::subscribe))
        .route("/visits", post(api::track_visit))
        // Theme preferences
        .route(
            "/preferences",
            get(api::get_preferences).put(api::update_preferences),
        )
        // Auth
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout))
        .route("/auth/me", get(api::current_user));

    // Admin routes behind the session guard
    let admin_routes = Router::new()
        // Posts
        .route("/posts", get(api::admin_list_posts))
        .route("/posts", post(api::create_post))
        .route("/posts/{id}", put(api::update_post))
        .route("/posts/{id}", delete(api::delete_post))
        // Images
        .route("/images", post(api::upload_image))
        .route("/images/{id}", delete(api::delete_image))
        // Subscribers
        .route("/subscribers", get(api::list_subscribers))
        .route("/subscribers/export", get(api::export_subscribers))
        .route("/subscribers/{id}/unsubscribe", post(api::unsubscribe))
        .route("/subscribers/{id}", delete(api::delete_subscriber))
        // Analytics
        .route("/stats/visitors", get(api::visitor_stats))
        .route("/stats/subscribers", get(api::subscriber_stats))
        .route("/stats/summary", get(api::stats_summary))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes)
        .nest("/api/admin", admin_routes)
        .nest_service(
            storage::PUBLIC_PREFIX,
            ServeDir::new(&state.config.uploads_dir),
        )
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
