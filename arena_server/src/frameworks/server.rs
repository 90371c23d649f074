// Framework bootstrap for the arena server runtime.

use crate::domain::ports::SystemClock;
use crate::frameworks::config;
use crate::interface_adapters::net::{
    get_room_handler, health_handler, list_rooms_handler, ws_handler,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RegistrySettings, RoomRegistry, RoomTuning};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms", get(list_rooms_handler))
        .route("/rooms/{room_id}", get(get_room_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let app = router(build_state());

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let settings = RegistrySettings {
        command_channel_capacity: config::COMMAND_CHANNEL_CAPACITY,
        update_broadcast_capacity: config::ROOM_BROADCAST_CAPACITY,
        tick_interval: config::tick_interval(),
        tuning: RoomTuning::default(),
    };
    tracing::debug!(
        tick_ms = settings.tick_interval.as_millis(),
        command_capacity = settings.command_channel_capacity,
        broadcast_capacity = settings.update_broadcast_capacity,
        "room registry configured"
    );

    // Rooms are created on demand by clients; none exist at startup.
    let room_registry = Arc::new(RoomRegistry::new(settings, Arc::new(SystemClock)));

    Arc::new(AppState { room_registry })
}
