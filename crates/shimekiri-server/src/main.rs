#![forbid(unsafe_code)]

use shimekiri_model::ExternalIdentity;
use shimekiri_server::{
    build_router, validate_startup_config, AppConfig, AppState, FakeIdentityProvider, SystemClock,
};
use shimekiri_store::Store;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("SHIMEKIRI_LOG_JSON", false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn dev_identity_from_env() -> ExternalIdentity {
    ExternalIdentity {
        provider_id: env_string("SHIMEKIRI_DEV_PROVIDER_ID", "1111111"),
        nickname: env_string("SHIMEKIRI_DEV_NICKNAME", "test"),
        name: env_string("SHIMEKIRI_DEV_NAME", "testuser"),
        avatar_url: env_string(
            "SHIMEKIRI_DEV_AVATAR_URL",
            "https://avatars.example/285/abott.png",
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env_string("SHIMEKIRI_BIND", "0.0.0.0:8080");
    let config = AppConfig {
        session_cookie: env_string("SHIMEKIRI_SESSION_COOKIE", "shimekiri_session"),
        max_body_bytes: env_usize("SHIMEKIRI_MAX_BODY_BYTES", 16 * 1024),
        db_path: env::var("SHIMEKIRI_DB_PATH").ok().map(PathBuf::from),
        ..AppConfig::default()
    };
    validate_startup_config(&config)?;

    let store = match &config.db_path {
        Some(path) => Store::open(path),
        None => Store::open_in_memory(),
    }
    .map_err(|e| format!("store open failed: {e}"))?;
    if config.db_path.is_none() {
        warn!("SHIMEKIRI_DB_PATH is unset; todos live in memory and die with the process");
    }

    // Real social login plugs in behind IdentityProvider; until it is wired,
    // /auth/callback authenticates the env-configured development identity.
    warn!("using the development identity provider");
    let provider = Arc::new(FakeIdentityProvider::new(dev_identity_from_env()));

    let state = AppState::with_config(store, provider, Arc::new(SystemClock), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("bind {bind_addr} failed: {e}"))?;
    info!("shimekiri-server listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| format!("server failed: {e}"))
}
