//! Single-Instrument Order Book Matching Core
//!
//! A limit order book for one instrument with strict price-time priority
//! matching, plus the service plumbing needed to run it: a single-owner
//! tokio engine, a lock-wrapped book for plain threads, Prometheus metrics
//! and JSON/env configuration.
//!
//! # Features
//!
//! - **Price-Time Priority**: Best price first, FIFO by arrival within a level
//! - **Limit and Market Orders**: Limit orders rest their remainder, market
//!   orders fill completely or are rejected without touching the book
//! - **Cancellation**: Resting orders can be pulled by id at any time
//! - **Serialized Access**: Either through [`engine::Engine`] or [`SharedOrderBook`]
//! - **Monitoring**: Counters, gauges and latency histograms via `metrics`
//!
//! # Quick Start
//!
//! ```rust
//! use orderbook_matching_core::{OrderBook, Side};
//!
//! let mut book = OrderBook::new("AAPL".to_string());
//!
//! // Rest some liquidity, then take part of it
//! book.submit_limit_order(Side::Ask, 15_000, 100)?;
//! let matches = book.submit_market_order(Side::Bid, 40)?;
//!
//! assert_eq!(matches[0].quantity, 40);
//! assert_eq!(book.ask_total_volume(), 60);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! The order book keeps two layers per side:
//!
//! 1. **Price Levels**: `BTreeMap<Price, PriceLevel>`, read from the top for bids
//!    and from the bottom for asks
//! 2. **Order Queues**: Each level holds a `VecDeque` of order ids in arrival order
//!
//! Orders themselves live in one id-keyed map owned by the book; a resting
//! order only records the price of the level it sits in.

pub mod config;
pub mod engine;
pub mod metrics;
pub mod orderbook;
pub mod shared;
pub mod utils;

// Re-export commonly used types
pub use orderbook::{
    error::{OrderBookError, OrderBookResult},
    types::{LimitOrderOutcome, Match, Order, OrderId, Price, Quantity, Side},
    OrderBook, OrderBookStats,
};

pub use config::EngineConfig;
pub use engine::{Engine, EngineHandle};
pub use metrics::OrderBookMetrics;
pub use shared::SharedOrderBook;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::orderbook::operations::{BatchOperations, OrderRequest};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_basic_trading_workflow() {
        let mut book = OrderBook::new("TEST".to_string());

        // Add liquidity
        let sell = book.submit_limit_order(Side::Ask, 10_000, 100).unwrap();
        assert!(sell.matches.is_empty());
        assert_eq!(sell.resting_quantity, 100);

        // Match with market order
        let matches = book.submit_market_order(Side::Bid, 50).unwrap();
        assert_eq!(matches.len(), 1);

        // Verify trade occurred
        assert_eq!(matches[0].price, 10_000);
        assert_eq!(matches[0].quantity, 50);
        assert_eq!(matches[0].ask_order_id(), sell.order_id);
        assert_eq!(book.last_trade_price(), Some(10_000));
    }

    #[test]
    fn test_batch_then_cancel_everything() {
        let mut book = OrderBook::new("TEST".to_string());
        let requests = (0..10u64)
            .map(|i| OrderRequest::Limit {
                side: if i % 2 == 0 { Side::Bid } else { Side::Ask },
                price: if i % 2 == 0 { 9_990 - i } else { 10_010 + i },
                quantity: 10,
            })
            .collect();

        let responses = BatchOperations::process_batch(&mut book, requests);
        assert!(responses.iter().all(Result::is_ok));
        assert_eq!(book.total_orders(), 10);

        let ids: Vec<OrderId> = (1..=10).collect();
        let cancelled = BatchOperations::cancel_batch(&mut book, ids);
        assert!(cancelled.iter().all(Result::is_ok));
        assert_eq!(book.total_orders(), 0);
        assert_eq!(book.bids().level_count(), 0);
        assert_eq!(book.asks().level_count(), 0);
    }

    #[test]
    fn test_concurrent_trading() {
        let book = SharedOrderBook::new(OrderBook::new("TEST".to_string()));
        let metrics = Arc::new(OrderBookMetrics::new());
        let mut handles = vec![];

        // Spawn multiple trading threads
        for thread_id in 0..4u64 {
            let book = book.clone();
            let metrics = Arc::clone(&metrics);
            handles.push(thread::spawn(move || {
                for i in 0..100u64 {
                    let price = 10_000 + (thread_id * 100) + i;
                    metrics.increment_limit_orders();
                    metrics
                        .time_limit_order(|| book.place_limit_order(Side::Bid, price, 100))
                        .unwrap();
                }
            }));
        }

        // Wait for completion
        for handle in handles {
            handle.join().unwrap();
        }

        // Verify all orders were added
        assert_eq!(book.read(OrderBook::total_orders), 400);
        assert_eq!(metrics.get_limit_orders(), 400);
        assert_eq!(metrics.get_latency_stats().limit_order.samples, 400);
    }

    #[tokio::test]
    async fn test_engine_matches_direct_book() {
        let script = [
            (Side::Ask, 10_100, 30),
            (Side::Ask, 10_000, 20),
            (Side::Bid, 9_900, 15),
            (Side::Bid, 10_100, 35),
            (Side::Ask, 9_800, 40),
        ];

        let mut direct = OrderBook::new("TEST".to_string());
        let (handle, task) = Engine::spawn(OrderBook::new("TEST".to_string()), 8, None);

        for (side, price, quantity) in script {
            let expected = direct.submit_limit_order(side, price, quantity).unwrap();
            let actual = handle.place_limit_order(side, price, quantity).await.unwrap();
            assert_eq!(actual.matches, expected.matches);
            assert_eq!(actual.resting_quantity, expected.resting_quantity);
        }

        handle.shutdown().await.unwrap();
        let engine_book = task.await.unwrap();
        assert_eq!(engine_book.stats(), direct.stats());
    }
}
