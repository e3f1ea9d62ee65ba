//! HTTP gateway: router assembly and the serve loop.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::player::PlayerStatusHub;
use state::AppState;

/// Build the full application router.
///
/// Separated from [`run_server`] so the integration tests can drive the
/// router directly.
pub fn router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register/start", post(handlers::auth::register_start))
        .route(
            "/register/complete",
            post(handlers::auth::register_complete),
        )
        .route("/login/start", post(handlers::auth::login_start))
        .route("/login/complete", post(handlers::auth::login_complete))
        .route(
            "/derive-public-key",
            post(handlers::auth::derive_public_key),
        );

    let user_routes = Router::new()
        .route("/@me", get(handlers::users::me))
        .route("/{id}", patch(handlers::users::edit_user))
        .route("/{id}/sessions", get(handlers::sessions::list_sessions))
        .route(
            "/{id}/bookmarks",
            get(handlers::bookmarks::list_bookmarks).put(handlers::bookmarks::put_bookmarks),
        )
        .route(
            "/{id}/bookmarks/{tmdb_id}",
            post(handlers::bookmarks::add_bookmark).delete(handlers::bookmarks::delete_bookmark),
        )
        .route("/{id}/progress", get(handlers::progress::list_progress))
        .route(
            "/{id}/progress/import",
            put(handlers::progress::import_progress),
        )
        .route(
            "/{id}/progress/{tmdb_id}",
            put(handlers::progress::update_progress).delete(handlers::progress::delete_progress),
        )
        .route(
            "/{id}/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        );

    let session_routes = Router::new().route(
        "/{sid}",
        patch(handlers::sessions::patch_session).delete(handlers::sessions::delete_session),
    );

    let player_routes = Router::new().route(
        "/status",
        get(handlers::player::get_status).post(handlers::player::post_status),
    );

    Router::new()
        .route("/", get(handlers::misc::index))
        .route("/healthz", get(handlers::misc::health))
        .route("/meta", get(handlers::misc::meta))
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/sessions", session_routes)
        .nest("/player", player_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the HTTP server and block until it exits.
pub async fn run_server(config: &AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    // Background sweep for the in-memory watch-party relay.
    PlayerStatusHub::spawn_sweeper(state.player.clone());

    let app = router(state).merge(
        SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    println!("🚀 API listening on http://{addr}");
    println!("📖 API docs: http://{addr}/docs");
    tracing::info!(%addr, "server started");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
