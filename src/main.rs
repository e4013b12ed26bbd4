use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod cli;
mod config;
mod handler;
mod http;
mod listing;
mod logger;
mod server;

use config::{AppState, Config, HostEnvironment};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = cli::exit_code(&e);
            let _ = e.print();
            std::process::exit(code);
        }
    };
    let host = HostEnvironment::detect();
    let state = match Config::load(&cli).and_then(|cfg| AppState::build(cfg, host)) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("dirindex: {e}");
            std::process::exit(e.exit_code());
        }
    };
    logger::init(&state)?;

    // Multi-threaded runtime, worker count from config when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = state.config.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(state))
}

async fn async_main(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.get_socket_addr()?;
    let listener = server::create_reusable_listener(addr, state.config.server.backlog)?;
    let active_connections = Arc::new(AtomicUsize::new(0));

    logger::log_server_start(&listener.local_addr()?, &state);

    server::run_server_loop(
        listener,
        state,
        active_connections,
        server::signal::shutdown_signal(),
    )
    .await;

    logger::log_info("Server stopped");
    Ok(())
}
