//! RSVP microsite HTTP server.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rsvp_microsite::config::Config;
use rsvp_microsite::email::{Mailer, ResendMailer};
use rsvp_microsite::hub::{CheckinHub, HubClient};
use rsvp_microsite::server::{AppState, build_router};
use rsvp_microsite::store::{EntryStore, PgEntryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsvp_microsite=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        enrichment = config.hub.is_some(),
        "Configuration loaded"
    );

    let store = PgEntryStore::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    info!("Database connected, migrations applied");

    let hub: Option<Arc<dyn CheckinHub>> = config
        .hub
        .as_ref()
        .map(|hub_config| Arc::new(HubClient::new(hub_config)) as Arc<dyn CheckinHub>);
    let mailer: Arc<dyn Mailer> = Arc::new(ResendMailer::new(&config.email));

    let state = AppState::new(&config, Arc::new(store) as Arc<dyn EntryStore>, hub, mailer);
    let app = build_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
