use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stockgate_lib::{QuoteGateway, YahooProvider};
use stockgate_server::{router, Cli, CorsPolicy};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stockgate=info".parse()?)
                .add_directive("stockchart_api=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cors = cli.cors_policy()?;

    let provider = YahooProvider::with_base_url(&cli.yahoo_base_url)
        .with_auto_adjust(!cli.no_auto_adjust);
    let gateway = QuoteGateway::new(Arc::new(provider));
    let app = router(gateway, &cors);

    match &cors {
        CorsPolicy::Permissive => {
            tracing::warn!("CORS is open: every origin, method and header is allowed")
        }
        CorsPolicy::Origins(list) => tracing::info!("CORS limited to {} origin(s)", list.len()),
    }

    let addr = cli.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
