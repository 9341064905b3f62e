#![forbid(unsafe_code)]
//! HTTP delivery for the shimekiri todo application.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use shimekiri_store::Store;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::Mutex;

mod auth;
mod clock;
mod config;
mod http;
mod ogp;

pub use auth::{AuthError, FakeIdentityProvider, IdentityProvider, SessionStore};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{validate_startup_config, AppConfig};
pub use ogp::{CardRenderer, PreviewError, PreviewRenderer};

pub const CRATE_NAME: &str = "shimekiri-server";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Store>>,
    pub sessions: Arc<SessionStore>,
    pub provider: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
    pub preview: Arc<dyn PreviewRenderer>,
    pub config: AppConfig,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Store, provider: Arc<dyn IdentityProvider>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(store, provider, clock, AppConfig::default())
    }

    #[must_use]
    pub fn with_config(
        store: Store,
        provider: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            sessions: Arc::new(SessionStore::new()),
            provider,
            clock,
            preview: Arc::new(CardRenderer::new(config.ogp_width, config.ogp_height)),
            request_id_seed: Arc::new(AtomicU64::new(1)),
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::home_handler))
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/version", get(http::handlers::version_handler))
        .route("/auth/callback", get(http::handlers::auth_callback_handler))
        .route("/auth/logout", get(http::handlers::logout_handler))
        .route("/users/:nickname", get(http::handlers::profile_handler))
        .route("/todos", post(http::handlers::create_todo_handler))
        .route(
            "/todos/:id",
            get(http::handlers::show_todo_handler).post(http::handlers::update_todo_handler),
        )
        .route("/todos/:id/delete", post(http::handlers::delete_todo_handler))
        .route(
            "/todos/completed/delete",
            post(http::handlers::delete_completed_handler),
        )
        .route("/todos/:id/ogp.png", get(http::handlers::ogp_handler))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .with_state(state)
}
