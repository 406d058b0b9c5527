use std::sync::Arc;

use tokio::sync::watch;

use gatehouse::{config, logger, server};

const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create Tokio runtime; worker and blocking pools follow the configuration
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    if let Some(blocking) = cfg.server.blocking_threads {
        runtime_builder.max_blocking_threads(blocking.max(1));
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(config::AppState::new(&cfg)?);
    let listener = server::create_listener(addr, cfg.server.backlog)?;

    logger::log_server_start(&addr, &cfg, state.dispatcher.route_count());
    if let Some(max_conn) = cfg.performance.max_connections {
        logger::log_info(&format!("Max connections: {max_conn}"));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    server::start_signal_handler(Arc::clone(&shutdown_tx));

    server::start_server_loop(listener, Arc::clone(&state), shutdown_rx).await;

    let remaining = server::drain_connections(&state, state.shutdown_grace()).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}
