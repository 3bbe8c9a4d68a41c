//! Matching Server
//!
//! Runs one order book behind the matching engine, feeds it a deterministic
//! stream of simulated order flow and exposes metrics for Prometheus.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use orderbook_matching_core::{
    engine::EngineHandle,
    metrics::{
        collectors::{LatencyCollector, ThroughputCollector},
        MetricsReporter,
    },
    utils::{format_price, price_to_ticks, time::LatencyTimer},
    Engine, EngineConfig, OrderBook, OrderBookError, OrderBookMetrics, OrderId, Side,
};

#[derive(Parser)]
#[command(name = "matching_server", about = "Single-instrument matching server")]
struct Cli {
    /// JSON config file, skipped when missing
    #[arg(short, long, default_value = "config.json")]
    config_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = EngineConfig::load(Some(cli.config_path.as_path()))?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    info!("Starting matching server for {}...", config.symbol);

    let metrics = if config.metrics.enabled {
        start_metrics_exporter(&config)?;
        let metrics = Arc::new(OrderBookMetrics::new());

        let reporter = MetricsReporter::new(
            Arc::clone(&metrics),
            Duration::from_secs(config.metrics.report_interval_secs),
        );
        tokio::spawn(async move {
            reporter.run().await;
        });

        Some(metrics)
    } else {
        None
    };

    let (handle, engine_task) = Engine::spawn(
        OrderBook::new(config.symbol.clone()),
        config.command_buffer,
        metrics,
    );

    // Start market activity simulation
    let simulation = {
        let handle = handle.clone();
        let tick_size = config.tick_size;
        tokio::spawn(async move {
            if let Err(e) = simulate_market_activity(handle, tick_size).await {
                error!("Market simulation stopped: {}", e);
            }
        })
    };

    // Start server statistics reporting
    let stats_reporter = {
        let handle = handle.clone();
        let tick_size = config.tick_size;
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(10));

            loop {
                interval.tick().await;

                match handle.stats().await {
                    Ok(stats) => info!(
                        "{} | Orders: {} | Bid: {:?} | Ask: {:?} | Spread: {:?} | Trades: {} | Volume: {}",
                        stats.symbol,
                        stats.total_orders,
                        stats.best_bid.map(|p| format_price(p, tick_size)),
                        stats.best_ask.map(|p| format_price(p, tick_size)),
                        stats.spread.map(|s| format_price(s, tick_size)),
                        stats.total_trades,
                        stats.total_volume
                    ),
                    Err(_) => break,
                }
            }
        })
    };

    info!("Matching server is running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down matching server...");

    simulation.abort();
    stats_reporter.abort();
    handle.shutdown().await?;

    let book = engine_task.await?;
    let stats = book.stats();
    info!(
        "Final stats for {}: {} resting orders, {} trades, {} traded quantity",
        stats.symbol, stats.total_orders, stats.total_trades, stats.total_volume
    );
    info!("Final top of book: {}", serde_json::to_string(&book.snapshot(5))?);

    Ok(())
}

/// Drive the engine with a repeating mix of limit, market and cancel requests
async fn simulate_market_activity(handle: EngineHandle, tick_size: f64) -> Result<(), OrderBookError> {
    let mut interval = interval(Duration::from_millis(10)); // 100 ops/second
    let mut base_price = price_to_ticks(100.0, tick_size).max(1_000); // Starting price in ticks
    let floor_price = base_price / 2;
    let mut order_counter: u64 = 0;
    let mut resting: Vec<OrderId> = Vec::new();

    let mut latencies = LatencyCollector::new(Duration::from_secs(10));
    let mut throughput = ThroughputCollector::new(Duration::from_secs(10));

    // Initial market making - add liquidity on both sides
    for i in 1..=50 {
        let bid = handle
            .place_limit_order(Side::Bid, base_price.saturating_sub(i * 10).max(1), 100)
            .await?;
        let ask = handle
            .place_limit_order(Side::Ask, base_price + i * 10, 100)
            .await?;
        resting.push(bid.order_id);
        resting.push(ask.order_id);
    }

    info!(
        "Initial liquidity added around {}",
        format_price(base_price, tick_size)
    );

    loop {
        interval.tick().await;
        order_counter += 1;

        let side = if order_counter % 2 == 0 {
            Side::Bid
        } else {
            Side::Ask
        };
        let timer = LatencyTimer::start();

        match order_counter % 10 {
            // Market orders (20% of activity)
            0 | 1 => {
                let quantity = 50 + (order_counter % 100);

                if let Err(OrderBookError::InsufficientLiquidity { available, .. }) =
                    handle.place_market_order(side, quantity).await
                {
                    // Not enough on the other side, add some
                    warn!(
                        "Market {} for {} rejected with {} available, replenishing",
                        side, quantity, available
                    );
                    let price = match side {
                        Side::Bid => base_price + 50,
                        Side::Ask => base_price.saturating_sub(50).max(1),
                    };
                    let outcome = handle
                        .place_limit_order(side.opposite(), price, quantity)
                        .await?;
                    resting.push(outcome.order_id);
                }
            }

            // Limit orders (60% of activity)
            2..=7 => {
                let offset = order_counter % 20;
                let price = match side {
                    Side::Bid => base_price.saturating_sub(offset).max(1),
                    Side::Ask => base_price + offset,
                };
                let quantity = 100 + (order_counter % 200);

                let outcome = handle.place_limit_order(side, price, quantity).await?;
                if outcome.resting_quantity > 0 {
                    resting.push(outcome.order_id);
                }
            }

            // Cancellations (10% of activity)
            8 => {
                if resting.len() > 10 {
                    let order_id = resting.swap_remove((order_counter as usize) % resting.len());
                    match handle.cancel_order(order_id).await {
                        // Already filled by an earlier sweep
                        Ok(_) | Err(OrderBookError::OrderNotFound(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
            }

            // Price drift (10% of activity)
            9 => {
                let direction: i64 = if order_counter % 4 == 1 { 1 } else { -1 };
                base_price = ((base_price as i64) + direction).max(floor_price as i64) as u64;
            }

            _ => unreachable!(),
        }

        latencies.record(timer.stop());
        throughput.add(1);

        if let Some(stats) = throughput.collect() {
            let latency = latencies.drain().to_micros();
            info!(
                "Simulation: {} requests ({:.0}/s) | round trip (μs): mean={:.1} p50={:.1} p99={:.1} max={:.1}",
                stats.operations, stats.rate, latency.mean, latency.p50, latency.p99, latency.max
            );
        }
    }
}

/// Install the Prometheus recorder with its own HTTP listener
fn start_metrics_exporter(config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let addr = config.metrics.listen_addr;

    PrometheusBuilder::new().with_http_listener(addr).install()?;

    info!("Prometheus metrics available at http://{}/metrics", addr);

    Ok(())
}
