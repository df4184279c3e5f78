use std::sync::Arc;

use activity_backend::{
    api,
    config::AppConfig,
    logger::init_tracing,
    market::{
        binance::BinanceClient,
        manager::{MarketManager, MarketSettings},
        types::Market,
    },
    metrics::counters::Counters,
    persistence::{ActivityRepository, JsonFileRepository},
    scheduler::{self, Cadence},
};
use anyhow::Context;

/// Builds one manager per market and restores its persisted log.
async fn init_markets(
    cfg: &AppConfig,
    client: &BinanceClient,
    counters: &Counters,
) -> anyhow::Result<Vec<Arc<MarketManager>>> {
    tokio::fs::create_dir_all(&cfg.data_dir)
        .await
        .with_context(|| format!("failed to create data dir {}", cfg.data_dir.display()))?;

    let repo: Arc<dyn ActivityRepository> = Arc::new(JsonFileRepository::new(&cfg.data_dir));
    let settings = MarketSettings::from_config(cfg);

    let mut markets = Vec::with_capacity(Market::ALL.len());
    for market in Market::ALL {
        let mm = Arc::new(MarketManager::new(
            market,
            Arc::new(client.clone()),
            Arc::clone(&repo),
            settings.clone(),
            counters.clone(),
        ));
        mm.load().await;
        markets.push(mm);
    }

    Ok(markets)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting activity backend...");

    let cfg = AppConfig::from_env();

    let addr = cfg.socket_addr()?;

    let client = BinanceClient::new(
        cfg.spot_api_url.clone(),
        cfg.futures_api_url.clone(),
        cfg.http_timeout,
    )
    .context("failed to build exchange client")?;

    let counters = Counters::default();
    let markets = init_markets(&cfg, &client, &counters).await?;

    let tasks = scheduler::spawn_all(&markets, Cadence::from_config(&cfg));

    let routes = api::routes(
        Arc::clone(&markets[0]),
        Arc::clone(&markets[1]),
        client.http().clone(),
    );

    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .with_context(|| format!("failed to bind read API on {}", addr))?;

    tracing::info!(addr = %bound, "read API listening");
    server.await;

    tracing::info!("Shutdown signal received");
    for t in tasks {
        t.abort();
    }

    Ok(())
}
