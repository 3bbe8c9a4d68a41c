use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use crate::orderbook::{Match, OrderBookStats};
use crate::utils::time::LatencyTimer;

pub mod collectors;

/// Metrics collector for order book operations
///
/// Keeps local atomic copies of everything it reports so the values can be
/// read back without a metrics recorder installed.
#[derive(Debug)]
pub struct OrderBookMetrics {
    // Latency tracking
    limit_order_latency: LatencyTracker,
    market_order_latency: LatencyTracker,
    cancel_order_latency: LatencyTracker,

    // Throughput counters
    limit_orders: AtomicU64,
    market_orders: AtomicU64,
    orders_cancelled: AtomicU64,
    orders_rejected: AtomicU64,
    matches_executed: AtomicU64,

    // Volume tracking
    total_volume: AtomicU64,
    total_notional: AtomicU64,
}

impl OrderBookMetrics {
    pub fn new() -> Self {
        // Register metric descriptions
        describe_counter!("orderbook_orders_total", "Total number of orders processed");
        describe_counter!("orderbook_rejections_total", "Requests rejected by the book");
        describe_counter!("orderbook_matches_total", "Total number of matches executed");
        describe_counter!("orderbook_volume_total", "Total traded quantity");
        describe_counter!("orderbook_notional_total", "Total traded notional in ticks");
        describe_histogram!(
            "orderbook_operation_duration_seconds",
            "Duration of order book operations"
        );
        describe_gauge!(
            "orderbook_levels_total",
            "Number of price levels in the book"
        );
        describe_gauge!(
            "orderbook_orders_current",
            "Current number of orders in the book"
        );
        describe_gauge!("orderbook_volume_resting", "Resting quantity per side");
        describe_gauge!("orderbook_spread_ticks", "Current bid-ask spread in ticks");

        Self {
            limit_order_latency: LatencyTracker::new("limit_order"),
            market_order_latency: LatencyTracker::new("market_order"),
            cancel_order_latency: LatencyTracker::new("cancel_order"),
            limit_orders: AtomicU64::new(0),
            market_orders: AtomicU64::new(0),
            orders_cancelled: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            matches_executed: AtomicU64::new(0),
            total_volume: AtomicU64::new(0),
            total_notional: AtomicU64::new(0),
        }
    }

    // Latency measurement methods
    pub fn time_limit_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.limit_order_latency.time(f)
    }

    pub fn time_market_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.market_order_latency.time(f)
    }

    pub fn time_cancel_order<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.cancel_order_latency.time(f)
    }

    // Counter methods
    pub fn increment_limit_orders(&self) {
        self.limit_orders.fetch_add(1, Ordering::Relaxed);
        counter!("orderbook_orders_total", "type" => "limit").increment(1);
    }

    pub fn increment_market_orders(&self) {
        self.market_orders.fetch_add(1, Ordering::Relaxed);
        counter!("orderbook_orders_total", "type" => "market").increment(1);
    }

    pub fn increment_orders_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
        counter!("orderbook_orders_total", "type" => "cancel").increment(1);
    }

    pub fn increment_orders_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
        counter!("orderbook_rejections_total").increment(1);
    }

    pub fn record_matches(&self, matches: &[Match]) {
        if matches.is_empty() {
            return;
        }

        let quantity = matches
            .iter()
            .fold(0u64, |sum, m| sum.saturating_add(m.quantity));
        let notional = matches
            .iter()
            .fold(0u128, |sum, m| sum.saturating_add(m.notional()));
        // Notional is kept in ticks and pinned at u64::MAX if it gets there
        let notional = u64::try_from(notional).unwrap_or(u64::MAX);

        saturating_add(&self.matches_executed, matches.len() as u64);
        saturating_add(&self.total_volume, quantity);
        saturating_add(&self.total_notional, notional);

        counter!("orderbook_matches_total").increment(matches.len() as u64);
        counter!("orderbook_volume_total").increment(quantity);
        counter!("orderbook_notional_total").increment(notional);
    }

    // Gauge methods
    pub fn update_book_state(&self, stats: &OrderBookStats) {
        gauge!("orderbook_orders_current").set(stats.total_orders as f64);
        gauge!("orderbook_levels_total", "side" => "bid").set(stats.bid_levels as f64);
        gauge!("orderbook_levels_total", "side" => "ask").set(stats.ask_levels as f64);
        gauge!("orderbook_volume_resting", "side" => "bid").set(stats.bid_volume as f64);
        gauge!("orderbook_volume_resting", "side" => "ask").set(stats.ask_volume as f64);

        if let Some(spread) = stats.spread {
            gauge!("orderbook_spread_ticks").set(spread as f64);
        }
        if let Some(bid) = stats.best_bid {
            gauge!("orderbook_best_bid").set(bid as f64);
        }
        if let Some(ask) = stats.best_ask {
            gauge!("orderbook_best_ask").set(ask as f64);
        }
    }

    // Getters for current values
    pub fn get_limit_orders(&self) -> u64 {
        self.limit_orders.load(Ordering::Relaxed)
    }

    pub fn get_market_orders(&self) -> u64 {
        self.market_orders.load(Ordering::Relaxed)
    }

    pub fn get_orders_cancelled(&self) -> u64 {
        self.orders_cancelled.load(Ordering::Relaxed)
    }

    pub fn get_orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    pub fn get_matches_executed(&self) -> u64 {
        self.matches_executed.load(Ordering::Relaxed)
    }

    pub fn get_total_volume(&self) -> u64 {
        self.total_volume.load(Ordering::Relaxed)
    }

    pub fn get_total_notional(&self) -> u64 {
        self.total_notional.load(Ordering::Relaxed)
    }

    pub fn get_latency_stats(&self) -> LatencyStats {
        LatencyStats {
            limit_order: self.limit_order_latency.get_stats(),
            market_order: self.market_order_latency.get_stats(),
            cancel_order: self.cancel_order_latency.get_stats(),
        }
    }
}

fn saturating_add(counter: &AtomicU64, value: u64) {
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_add(value))
    });
}

impl Default for OrderBookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency tracker for individual operations
#[derive(Debug)]
struct LatencyTracker {
    operation: &'static str,
    samples: AtomicU64,
    total_nanos: AtomicU64,
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl LatencyTracker {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            samples: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
        }
    }

    fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let timer = LatencyTimer::start();
        let result = f();
        self.record_latency(timer.stop());
        result
    }

    fn record_latency(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;

        self.samples.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.min_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);

        // Record in metrics system
        histogram!("orderbook_operation_duration_seconds", "operation" => self.operation)
            .record(duration.as_secs_f64());
    }

    fn get_stats(&self) -> OperationLatencyStats {
        let samples = self.samples.load(Ordering::Relaxed);
        let total = self.total_nanos.load(Ordering::Relaxed);
        let min = self.min_nanos.load(Ordering::Relaxed);
        let max = self.max_nanos.load(Ordering::Relaxed);

        let avg = if samples > 0 { total / samples } else { 0 };

        OperationLatencyStats {
            operation: self.operation,
            samples,
            avg_nanos: avg,
            min_nanos: if min == u64::MAX { 0 } else { min },
            max_nanos: max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LatencyStats {
    pub limit_order: OperationLatencyStats,
    pub market_order: OperationLatencyStats,
    pub cancel_order: OperationLatencyStats,
}

#[derive(Debug, Clone)]
pub struct OperationLatencyStats {
    pub operation: &'static str,
    pub samples: u64,
    pub avg_nanos: u64,
    pub min_nanos: u64,
    pub max_nanos: u64,
}

impl OperationLatencyStats {
    pub fn avg_micros(&self) -> f64 {
        self.avg_nanos as f64 / 1_000.0
    }

    pub fn max_micros(&self) -> f64 {
        self.max_nanos as f64 / 1_000.0
    }
}

/// Background metrics reporter
pub struct MetricsReporter {
    metrics: Arc<OrderBookMetrics>,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<OrderBookMetrics>, interval: Duration) -> Self {
        Self { metrics, interval }
    }

    pub async fn run(&self) {
        let mut interval = interval(self.interval);

        loop {
            interval.tick().await;

            let stats = self.metrics.get_latency_stats();

            info!(
                "OrderBook Metrics - Orders: limit={} market={} cancel={} rejected={} | Matches: {} | Latency (μs): limit={:.2} market={:.2} cancel={:.2}",
                self.metrics.get_limit_orders(),
                self.metrics.get_market_orders(),
                self.metrics.get_orders_cancelled(),
                self.metrics.get_orders_rejected(),
                self.metrics.get_matches_executed(),
                stats.limit_order.avg_micros(),
                stats.market_order.avg_micros(),
                stats.cancel_order.avg_micros()
            );
        }
    }
}
