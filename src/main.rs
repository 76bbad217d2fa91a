use rsvp::{
    app,
    config::Config,
    event_registry::EventRegistry,
    flyers::DiskFlyerStore,
    models::NewEvent,
    state::AppState,
};
use std::sync::Arc;
use tracing::{info, warn};

const SAMPLE_EVENTS: [(&str, &str, &str, &str); 3] = [
    ("Bridal Shower", "Obong's bridal shower", "2025-05-01", "Lagos"),
    ("Birthday Party", "A birthday party", "2025-05-03", "Abuja"),
    ("Tech Party", "All-night coding", "2025-05-01", "Port Harcourt"),
];

async fn seed_registry_if_empty(events: &EventRegistry) {
    if !events.is_empty().await {
        return;
    }
    info!("event registry is empty, adding {} sample events", SAMPLE_EVENTS.len());
    for (title, description, date, location) in SAMPLE_EVENTS {
        let new_event = NewEvent {
            title: title.to_string(),
            description: description.to_string(),
            date: date.to_string(),
            location: location.to_string(),
            flyer_filename: None,
        };
        if let Err(e) = events.create_event(new_event).await {
            warn!("could not add sample event {:?}: {}", title, e);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rsvp=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let flyers = DiskFlyerStore::new(config.upload_dir.clone()).await?;

    let mut app_state = AppState::new(Arc::new(flyers));
    app_state.require_existing_event = config.require_existing_event;

    if config.seed_events {
        seed_registry_if_empty(&app_state.events).await;
    }

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
