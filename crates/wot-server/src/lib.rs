//! Web-of-trust server library logic.

pub mod api;
pub mod backend;
pub mod config;
pub mod directory;
pub mod identify;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wot_db::DbPool;
use wot_notify::SqliteNotificationStore;
use wot_service::{Collaborators, Identifier, WotService};

use backend::SqliteAttestations;
use directory::SqliteDirectory;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// User directory; also resolves the acting user in the auth middleware.
    pub directory: SqliteDirectory,
    /// Notification items, read directly by the listing endpoint.
    pub notifications: SqliteNotificationStore,
    /// Workflow orchestrator wired to the SQLite adapters.
    pub service: WotService,
}

impl AppState {
    /// Wires every SQLite adapter over `pool`, with `identifier` for
    /// interactive vouches.
    pub fn new(pool: DbPool, identifier: Arc<dyn Identifier>) -> Self {
        let directory = SqliteDirectory::new(pool.clone());
        let notifications = SqliteNotificationStore::new(pool.clone());
        let attestations = SqliteAttestations::new(pool);

        let service = WotService::new(Collaborators {
            resolver: Arc::new(directory.clone()),
            identifier,
            issuer: Arc::new(attestations.clone()),
            reader: Arc::new(attestations),
            notifications: Arc::new(notifications.clone()),
        });

        Self {
            directory,
            notifications,
            service,
        }
    }
}

/// Maximum request body size (64 KiB).
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/wot/vouch", post(api::vouch_handler))
        .route(
            "/api/wot/vouch/assertion",
            post(api::vouch_assertion_handler),
        )
        .route("/api/wot/react", post(api::react_handler))
        .route("/api/wot/react/by-name", post(api::react_by_name_handler))
        .route("/api/wot/revoke", post(api::revoke_handler))
        .route("/api/wot/mine", get(api::list_mine_handler))
        .route("/api/wot/user/{username}", get(api::list_for_handler))
        .route(
            "/api/wot/notifications",
            get(api::list_notifications_handler),
        )
        .route(
            "/api/wot/notifications/dismiss",
            post(api::dismiss_notifications_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(api::register_user_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
