//! Waypoint CLI and streaming chat API entry point.
//!
//! Binary name: `waypoint`
//!
//! Parses CLI arguments, sets up tracing, then either serves the chat API or
//! runs a one-shot thread command against the checkpoint database.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::LiveAppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "waypoint", &mut std::io::stdout());
        return Ok(());
    }

    waypoint_observe::tracing_setup::init_tracing(
        cli::log_filter(cli.verbose, cli.quiet),
        cli.otel,
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let data_dir = state::data_dir(cli.data_dir.as_deref());

    let result = match cli.command {
        Commands::Serve { host, port } => serve(&data_dir, host, port).await,
        Commands::ShowThread { id, json } => {
            let store = state::open_store(&data_dir).await?;
            cli::thread::show_thread(&store, &id, json).await
        }
        Commands::ResetThread { id } => {
            let store = state::open_store(&data_dir).await?;
            cli::thread::reset_thread(&store, &id).await
        }
        Commands::Completions { .. } => Ok(()),
    };

    waypoint_observe::tracing_setup::shutdown_tracing();
    result
}

async fn serve(
    data_dir: &std::path::Path,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let state = LiveAppState::init(data_dir).await?;

    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Waypoint API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {}",
        console::style(format!("Routing via {}", state.config.routing.url)).dim()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
