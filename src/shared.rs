//! Lock-wrapped order book for callers on plain threads.
//!
//! Every operation takes the one mutex for its whole duration, so a sweep and
//! its level cleanup are never observed half done.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::orderbook::operations::{OrderOperations, OrderRequest, OrderResponse};
use crate::orderbook::{
    LimitOrderOutcome, Match, Order, OrderBook, OrderBookResult, OrderId, Price, Quantity, Side,
};

#[derive(Debug, Clone)]
pub struct SharedOrderBook {
    inner: Arc<Mutex<OrderBook>>,
}

impl SharedOrderBook {
    pub fn new(book: OrderBook) -> Self {
        Self {
            inner: Arc::new(Mutex::new(book)),
        }
    }

    pub fn submit(&self, request: OrderRequest) -> OrderBookResult<OrderResponse> {
        OrderOperations::apply(&mut *self.inner.lock(), request)
    }

    pub fn place_limit_order(
        &self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> OrderBookResult<LimitOrderOutcome> {
        self.inner.lock().submit_limit_order(side, price, quantity)
    }

    pub fn place_market_order(&self, side: Side, quantity: Quantity) -> OrderBookResult<Vec<Match>> {
        self.inner.lock().submit_market_order(side, quantity)
    }

    pub fn cancel_order(&self, order_id: OrderId) -> OrderBookResult<Order> {
        self.inner.lock().cancel_order(order_id)
    }

    /// Run a query while holding the lock
    pub fn read<F, R>(&self, query: F) -> R
    where
        F: FnOnce(&OrderBook) -> R,
    {
        let book = self.inner.lock();
        query(&*book)
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.read(OrderBook::best_bid)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.read(OrderBook::best_ask)
    }

    pub fn bid_total_volume(&self) -> Quantity {
        self.read(OrderBook::bid_total_volume)
    }

    pub fn ask_total_volume(&self) -> Quantity {
        self.read(OrderBook::ask_total_volume)
    }

    /// Take the book back once every other clone is gone
    pub fn try_into_inner(self) -> Result<OrderBook, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<OrderBook> for SharedOrderBook {
    fn from(book: OrderBook) -> Self {
        Self::new(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_limit_orders() {
        let book = SharedOrderBook::new(OrderBook::new("TEST".to_string()));
        let mut handles = vec![];

        for thread_id in 0..4u64 {
            let book = book.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100u64 {
                    let price = 10_000 + thread_id * 100 + i;
                    book.place_limit_order(Side::Bid, price, 100).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(book.read(OrderBook::total_orders), 400);
        assert_eq!(book.bid_total_volume(), 40_000);
        assert_eq!(book.best_bid(), Some(10_399));
    }

    #[test]
    fn test_concurrent_crossing_flow_conserves_volume() {
        let book = SharedOrderBook::new(OrderBook::new("TEST".to_string()));
        let mut handles = vec![];

        // Makers rest 50 asks of 10 each, takers lift 5 at a time
        for thread_id in 0..2u64 {
            let book = book.clone();
            handles.push(thread::spawn(move || {
                for i in 0..25u64 {
                    book.place_limit_order(Side::Ask, 10_000 + thread_id + i % 3, 10)
                        .unwrap();
                }
            }));
        }
        for handle in handles.drain(..) {
            handle.join().unwrap();
        }

        for _ in 0..2 {
            let book = book.clone();
            handles.push(thread::spawn(move || {
                let mut filled = 0;
                for _ in 0..20 {
                    let matches = book.place_market_order(Side::Bid, 5).unwrap();
                    filled += matches.iter().map(|m| m.quantity).sum::<u64>();
                }
                assert_eq!(filled, 100);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(book.ask_total_volume(), 500 - 200);
        assert_eq!(book.bid_total_volume(), 0);
        assert!(book.best_ask().is_some());
    }

    #[test]
    fn test_submit_and_cancel() {
        let book = SharedOrderBook::from(OrderBook::new("TEST".to_string()));

        let response = book
            .submit(OrderRequest::Limit {
                side: Side::Bid,
                price: 9_950,
                quantity: 7,
            })
            .unwrap();
        let OrderResponse::Limit(outcome) = response else {
            panic!("expected a limit response");
        };

        let cancelled = book.cancel_order(outcome.order_id).unwrap();
        assert_eq!(cancelled.remaining_quantity, 7);
        assert_eq!(book.best_bid(), None);

        let inner = book.try_into_inner().unwrap();
        assert_eq!(inner.total_orders(), 0);
    }
}
