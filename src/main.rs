/// Quick Train Times: departure boards for the quick times active right now
mod clients;
mod config;
mod domain;
mod errors;
mod handlers;
mod lookup;
mod render;
mod repo;
mod resolver;
mod routes;
mod services;
mod utils;

use crate::clients::LdbClient;
use crate::config::{poll_interval, AppConfig};
use crate::handlers::AppState;
use crate::lookup::Lookup;
use crate::render::render_board;
use crate::repo::{rule_repo, settings_repo};
use crate::routes::build_router;
use crate::services::{BoardService, RuleStore};
use crate::utils::validate_key;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Using data directory {}", config.data_dir.display());

    let lookup = match &config.stations_file {
        Some(path) => Lookup::with_station_file(path).await?,
        None => Lookup::bundled()?,
    };
    let lookup = Arc::new(lookup);
    info!(
        "Loaded {} stations (list {})",
        lookup.stations().len(),
        lookup.stations().version()
    );

    let mut settings = settings_repo(&config.data_dir).load().await?;
    if let Some(key) = &config.api_key {
        settings.key = key.clone();
    }
    if let Err(e) = validate_key(&settings.key) {
        warn!("{}", e);
    }
    if settings.is_offline() {
        warn!("No API key configured, departure boards will stay empty");
    }

    let rules = Arc::new(RuleStore::open(rule_repo(&config.data_dir), lookup.clone()).await?);
    let client = LdbClient::new(config.ldb_base_url.clone(), config.http_timeout)?;
    info!("Departure boards from {}", client.base_url());

    let board = Arc::new(BoardService::new(rules.clone(), Arc::new(client), settings));

    start_ticker(board.clone(), lookup.clone());

    let state = AppState {
        rules,
        board,
        lookup,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("quick_train_times listening on {}", config.listen_addr);

    axum::serve(listener, app.into_make_service()).await?;

    info!("exiting, thank you for using Quick Train Times");
    Ok(())
}

/// Refresh and print the board every `freq` seconds
fn start_ticker(board: Arc<BoardService>, lookup: Arc<Lookup>) {
    let interval = poll_interval(board.settings().freq);
    tokio::spawn(async move {
        info!("Starting board refresh task (interval: {:?})", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match board.refresh().await {
                Ok(snapshot) => println!("{}", render_board(&snapshot, &lookup)),
                Err(e) => error!("Board refresh error: {:?}", e),
            }
        }
    });
}
