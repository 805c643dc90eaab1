// Framework bootstrap for the arena server runtime.

use crate::domain::ArenaTuning;
use crate::frameworks::config;
use crate::interface_adapters::net::spawn_arena_serializer;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ArenaHandle, ArenaSettings};

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

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();
    let app = app(state);

    tracing::info!(%address, "listening");

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
    let tuning = ArenaTuning::default();
    tracing::debug!(
        world_width = tuning.world_width,
        world_height = tuning.world_height,
        attack_range = tuning.attack_range,
        attack_damage = tuning.attack_damage,
        "arena tuning"
    );

    // One arena per process; its world task owns every player record.
    let arena = ArenaHandle::spawn(ArenaSettings {
        input_channel_capacity: config::INPUT_CHANNEL_CAPACITY,
        outbound_broadcast_capacity: config::OUTBOUND_BROADCAST_CAPACITY,
        tuning,
    });
    spawn_arena_serializer(&arena);

    Arc::new(AppState { arena })
}
