use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use handlers::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = match state
        .config
        .cors_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    Router::new()
        .route("/health", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/prompts",
            get(handlers::prompts::list_prompts).post(handlers::prompts::create_prompt),
        )
        .route(
            "/api/prompts/:id",
            put(handlers::prompts::update_prompt).delete(handlers::prompts::delete_prompt),
        )
        .route(
            "/api/requests",
            get(handlers::requests::list_requests).post(handlers::requests::create_request),
        )
        .route("/api/requests/:id", put(handlers::requests::update_request))
        .route("/api/redeem/claim", post(handlers::redeem::claim))
        .route("/api/redeem/codes", post(handlers::redeem::create_code))
        .route("/api/users", get(handlers::users::list_users))
        .route(
            "/api/users/:id",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route("/api/users/:id/quota", get(handlers::users::get_quota))
        .route("/api/favorites/toggle", post(handlers::favorites::toggle_favorite))
        .route("/api/stats/dashboard", get(handlers::stats::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
