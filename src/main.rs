use std::env;

use tokio::task::JoinSet;
use young_suns_companion::{
    actor::{broker::Broker, companion::Companion, dispatcher::Dispatcher, refresh},
    api::websocket,
    config::Config,
    instrumentation,
    store::DataService,
};

#[tokio::main]
async fn main() {
    let mut config = Config::from_env();
    if let Some(addr) = env::args().nth(1) {
        config.listen_addr = addr;
    }

    instrumentation::init_tracing(config.log_format).expect("Failed to set global subscriber");
    tracing::info!("Starting the companion...");

    let store = match DataService::from_config(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open cache at {}: {}", config.cache_dir.display(), e);
            return;
        }
    };

    let mut dispatcher = Dispatcher::new(Broker::new(), Companion::load_cached(store.clone()));
    dispatcher.start(config.workers).await;

    let refresh_handle = refresh::spawn_startup_refresh(store, dispatcher.topic());

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(socket) => socket,
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", config.listen_addr, e);
            dispatcher.force_stop().await;
            return;
        }
    };

    tracing::info!("Listening for WebSocket connections on {}", config.listen_addr);

    let mut handles = JoinSet::new();

    loop {
        tokio::select! {
            Ok((stream, peer)) = listener.accept() => {
                tracing::info!("New connection from {}", peer);
                handles.spawn(websocket::accept_connection(stream, dispatcher.topic()));
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, stopping dispatcher...");
                break;
            }
        }
    }

    refresh_handle.abort();
    dispatcher.stop().await;
    handles.abort_all();
    while handles.join_next().await.is_some() {}

    tracing::info!("All workers have been stopped.");
}
