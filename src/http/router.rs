//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Category/line/stop CRUD lives under /api. The "creat" spelling is the
    // published path and clients depend on it.
    let catalog_api = Router::new()
        .route("/creat/category", post(handlers::create_category))
        .route("/category/{category_id}", get(handlers::get_category))
        .route(
            "/update/category/{category_id}",
            put(handlers::update_category),
        )
        .route(
            "/delete/category/{category_id}",
            delete(handlers::delete_category),
        )
        .route("/allcategory", get(handlers::list_categories))
        .route("/creat/line", post(handlers::create_line))
        .route("/line/{line_id}", get(handlers::get_line))
        .route("/update/line/{line_id}", put(handlers::update_line))
        .route("/delete/line/{line_id}", delete(handlers::delete_line))
        .route("/allline", get(handlers::list_lines))
        .route("/creat/stop", post(handlers::create_stop))
        .route("/stop/{stop_id}", get(handlers::get_stop))
        .route("/update/stop/{stop_id}", put(handlers::update_stop))
        .route("/delete/stop/{stop_id}", delete(handlers::delete_stop))
        .route("/allstop", get(handlers::list_stops));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/token", post(handlers::login))
        .route("/users/me", get(handlers::read_users_me))
        .route("/users", post(handlers::create_user))
        .route("/users/{user_id}", get(handlers::get_user))
        .route("/update/users/{user_id}", put(handlers::update_user))
        .route("/delete/users/{user_id}", delete(handlers::delete_user))
        .route("/allusers", get(handlers::list_users))
        .nest("/api", catalog_api)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
