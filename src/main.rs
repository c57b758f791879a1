//! HangSmart Backend
//!
//! A REST backend for group activity planning: accounts and sessions,
//! groups joined by short codes, live group updates, and generated
//! activity recommendations.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod recs;
mod watch;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use recs::RecommendationGateway;
use watch::GroupWatch;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub watch: Arc<GroupWatch>,
    pub recs: Arc<RecommendationGateway>,
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

    tracing::info!("Starting HangSmart Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if upstream API keys are not configured
    if config.chat_api_key.is_none() {
        tracing::warn!(
            "No chat API key configured (HANGSMART_CHAT_API_KEY). Recommendations will fail!"
        );
    }
    if config.places_api_key.is_none() {
        tracing::warn!(
            "No places API key configured (HANGSMART_PLACES_API_KEY). Place enrichment is disabled."
        );
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    // Create application state
    let state = AppState {
        repo: Arc::new(Repository::new(pool)),
        watch: Arc::new(GroupWatch::new()),
        recs: Arc::new(RecommendationGateway::new(&config)),
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

    // Routes that require a session
    let protected_routes = Router::new()
        // Session
        .route("/auth/me", get(api::me))
        // Profile
        .route("/profile", get(api::get_profile))
        .route("/profile", put(api::update_profile))
        .route("/profile", delete(api::delete_profile))
        // Groups
        .route("/groups", post(api::create_group))
        .route("/groups/{code}", get(api::get_group))
        .route("/groups/{code}/join", post(api::join_group))
        .route("/groups/{code}/preferences", put(api::submit_preferences))
        .route("/groups/{code}/events", get(api::group_events))
        .route(
            "/groups/{code}/recommendations",
            get(api::get_recommendations),
        )
        // Apply session auth middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_auth_layer,
        ));

    // Sign-up/sign-in/sign-out work without a session
    let public_routes = Router::new()
        .route("/auth/signup", post(api::sign_up))
        .route("/auth/signin", post(api::sign_in))
        .route("/auth/signout", post(api::sign_out));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
