use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

use livesearch::{scraping, server, source, AppConfig, EventQueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::load().context("loading configuration")?;
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("serve") => serve(config).await,
        Some("scrape") => scrape(config, args.next()).await,
        Some(other) => anyhow::bail!("unknown command {other:?}, expected `serve` or `scrape [venue]`"),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let clock = config.clock()?;
    let events = source::from_config(&config).context("building event source")?;
    info!("serving events from {}", events.describe());

    let state = server::AppState {
        queries: EventQueryService::new(events, clock),
    };
    let app = server::router(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind addr {}", config.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!("livesearch listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn scrape(config: AppConfig, venue: Option<String>) -> anyhow::Result<()> {
    let output = config.scrape_output();
    let saved = tokio::task::spawn_blocking(move || -> anyhow::Result<usize> {
        let events = match venue.as_deref() {
            Some(id) => scraping::run_single(id)?,
            None => scraping::run_all()?,
        };
        scraping::save_events(&output, events)
    })
    .await
    .context("scrape task panicked")??;
    info!("scrape finished, {saved} events written");
    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
