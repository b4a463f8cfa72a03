use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use battle_persistence::connection::connect_and_migrate;
use battle_server::{
    config::Config, create_routes, dataset::ChallengeDataset, room_manager::RoomManager,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Prompt Battle server...");

    let config = Config::new();
    let connection_manager = Arc::new(ConnectionManager::new());

    info!("Loading challenge dataset from: {}", config.dataset_path);
    let dataset = match ChallengeDataset::load(&config.dataset_path) {
        Ok(dataset) => {
            info!("Loaded {} challenges", dataset.len());
            Arc::new(dataset)
        }
        Err(e) => {
            tracing::error!("Failed to load challenge dataset: {:#}", e);
            tracing::error!("Set DATASET_PATH to a csv of prompt,image_file rows.");
            std::process::exit(1);
        }
    };

    // Initialize database connection and run migrations
    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let room_manager = Arc::new(RoomManager::new(
        connection_manager.clone(),
        dataset,
        db,
        config.default_settings(),
    ));

    let routes = create_routes(
        connection_manager.clone(),
        room_manager.clone(),
        config.images_dir.clone(),
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_room_manager = room_manager.clone();
    let cleanup_config = config.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let connection_timeout =
                Duration::from_secs(cleanup_config.connection_timeout_seconds);
            let room_timeout = Duration::from_secs(cleanup_config.room_timeout_minutes * 60);

            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            cleanup_room_manager.cleanup_abandoned_rooms(room_timeout).await;
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let addr = (
        config.host.parse::<std::net::IpAddr>().unwrap(),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}
