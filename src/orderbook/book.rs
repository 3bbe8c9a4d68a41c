use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::orderbook::book_side::BookSide;
use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::matching::{MatchingEngine, PriceBound};
use crate::orderbook::types::{
    BookSnapshot, IdSource, LimitOrderOutcome, Match, Order, OrderId, Price, Quantity,
    SequentialIds, Side,
};
use crate::utils::time::Clock;

/// Limit order book for a single instrument.
///
/// Every mutation takes `&mut self`; the book does no locking of its own.
/// Wrap it in [`crate::engine`] or [`crate::shared`] to share it.
#[derive(Debug)]
pub struct OrderBook {
    pub symbol: String,

    bids: BookSide, // Buy orders (highest price first)
    asks: BookSide, // Sell orders (lowest price first)

    // Every resting order, keyed by id
    orders: HashMap<OrderId, Order>,

    id_source: Box<dyn IdSource>,
    next_sequence: u64,

    // Statistics
    last_trade_price: Option<Price>,
    total_trades: u64,
    total_volume: u64,
}

impl OrderBook {
    pub fn new(symbol: String) -> Self {
        Self::with_id_source(symbol, Box::new(SequentialIds::new()))
    }

    pub fn with_id_source(symbol: String, id_source: Box<dyn IdSource>) -> Self {
        info!("Creating new order book for symbol: {}", symbol);

        Self {
            symbol,
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            orders: HashMap::new(),
            id_source,
            next_sequence: 0,
            last_trade_price: None,
            total_trades: 0,
            total_volume: 0,
        }
    }

    /// Create a new order with a fresh id. Its time priority is stamped
    /// when it is placed, not here; until then `sequence` is 0.
    pub fn create_order(&mut self, side: Side, quantity: Quantity) -> Order {
        let id = self.id_source.next_id();
        Order::new(id, side, quantity, 0)
    }

    /// Match `order` against the opposing side up to `price` and rest any
    /// remainder at `price`.
    pub fn place_limit_order(&mut self, price: Price, mut order: Order) -> OrderBookResult<Vec<Match>> {
        debug!(
            "Placing limit order {}: {} {} @ {}",
            order.id, order.side, order.remaining_quantity, price
        );

        Self::validate_price(price)?;
        self.validate_incoming(&order)?;

        // Checked against the full quantity so nothing is touched on rejection
        if !self.side(order.side).can_rest(order.remaining_quantity) {
            return Err(OrderBookError::InvalidOrder(format!(
                "quantity {} would overflow {} side volume",
                order.remaining_quantity, order.side
            )));
        }

        order.sequence = self.next_sequence();
        let (own, opposite) = match order.side {
            Side::Bid => (&mut self.bids, &mut self.asks),
            Side::Ask => (&mut self.asks, &mut self.bids),
        };

        let matches = MatchingEngine::sweep(
            &mut order,
            PriceBound::Limit(price),
            opposite,
            &mut self.orders,
        )?;

        if !order.is_filled() {
            own.add_order(price, &mut order)?;
            debug!(
                "Order {} resting at {} on {} side with {}",
                order.id, price, order.side, order.remaining_quantity
            );
            self.orders.insert(order.id, order);
        }

        self.record_trades(&matches);
        Ok(matches)
    }

    /// Match `order` against the opposing side at any price. Rejected without
    /// touching the book unless the opposing side can fill it completely.
    pub fn place_market_order(&mut self, mut order: Order) -> OrderBookResult<Vec<Match>> {
        debug!(
            "Placing market order {}: {} {}",
            order.id, order.side, order.remaining_quantity
        );

        self.validate_incoming(&order)?;

        let available = MatchingEngine::available_quantity(
            order.side,
            PriceBound::Unbounded,
            self.side(order.side.opposite()),
        );
        if order.remaining_quantity > available {
            return Err(OrderBookError::InsufficientLiquidity {
                requested: order.remaining_quantity,
                available,
            });
        }

        order.sequence = self.next_sequence();
        let opposite = match order.side {
            Side::Bid => &mut self.asks,
            Side::Ask => &mut self.bids,
        };
        let matches = MatchingEngine::sweep(
            &mut order,
            PriceBound::Unbounded,
            opposite,
            &mut self.orders,
        )?;
        debug_assert!(order.is_filled(), "admitted market order left a remainder");

        self.record_trades(&matches);
        Ok(matches)
    }

    /// Create and place a limit order in one step
    pub fn submit_limit_order(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> OrderBookResult<LimitOrderOutcome> {
        Self::validate_price(price)?;
        Self::validate_quantity(quantity)?;

        let order = self.create_order(side, quantity);
        let order_id = order.id;
        let matches = self.place_limit_order(price, order)?;
        let resting_quantity = self
            .orders
            .get(&order_id)
            .map_or(0, |order| order.remaining_quantity);

        Ok(LimitOrderOutcome {
            order_id,
            matches,
            resting_quantity,
        })
    }

    /// Create and place a market order in one step
    pub fn submit_market_order(&mut self, side: Side, quantity: Quantity) -> OrderBookResult<Vec<Match>> {
        Self::validate_quantity(quantity)?;

        let order = self.create_order(side, quantity);
        self.place_market_order(order)
    }

    /// Remove a resting order from the book and hand it back
    pub fn cancel_order(&mut self, order_id: OrderId) -> OrderBookResult<Order> {
        debug!("Cancelling order: {}", order_id);

        let mut order = self
            .orders
            .remove(&order_id)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;

        let side = match order.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        side.remove_order(&mut order)?;

        debug!(
            "Order {} cancelled, {} remaining",
            order_id, order.remaining_quantity
        );
        Ok(order)
    }

    /// Look up a resting order
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Get current best bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Get current best ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Get current spread
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    pub fn bid_total_volume(&self) -> Quantity {
        self.bids.total_quantity()
    }

    pub fn ask_total_volume(&self) -> Quantity {
        self.asks.total_quantity()
    }

    /// The resting orders of one side
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    /// Get last trade price
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Get total number of orders in the book
    pub fn total_orders(&self) -> usize {
        self.orders.len()
    }

    /// Generate order book snapshot of the best `depth` levels per side
    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot {
            timestamp: Clock::now_utc(),
            bids: self.bids.depth(depth),
            asks: self.asks.depth(depth),
            last_trade_price: self.last_trade_price,
        }
    }

    /// Get statistics
    pub fn stats(&self) -> OrderBookStats {
        OrderBookStats {
            symbol: self.symbol.clone(),
            total_orders: self.total_orders(),
            bid_levels: self.bids.level_count(),
            ask_levels: self.asks.level_count(),
            bid_volume: self.bid_total_volume(),
            ask_volume: self.ask_total_volume(),
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread(),
            last_trade_price: self.last_trade_price,
            total_trades: self.total_trades,
            total_volume: self.total_volume,
        }
    }

    // Private helper methods

    fn validate_price(price: Price) -> OrderBookResult<()> {
        if price == 0 {
            return Err(OrderBookError::InvalidOrder(
                "price must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_quantity(quantity: Quantity) -> OrderBookResult<()> {
        if quantity == 0 {
            return Err(OrderBookError::InvalidOrder(
                "quantity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_incoming(&self, order: &Order) -> OrderBookResult<()> {
        Self::validate_quantity(order.remaining_quantity)?;
        if order.is_resting() || self.orders.contains_key(&order.id) {
            return Err(OrderBookError::DuplicateOrder(order.id));
        }
        Ok(())
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn record_trades(&mut self, matches: &[Match]) {
        if let Some(last) = matches.last() {
            // Lifetime counters saturate rather than wrap
            self.total_trades = self.total_trades.saturating_add(matches.len() as u64);
            for m in matches {
                self.total_volume = self.total_volume.saturating_add(m.quantity);
            }
            self.last_trade_price = Some(last.price);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookStats {
    pub symbol: String,
    pub total_orders: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub bid_volume: Quantity,
    pub ask_volume: Quantity,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub spread: Option<Price>,
    pub last_trade_price: Option<Price>,
    pub total_trades: u64,
    pub total_volume: u64,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new("DEFAULT".to_string())
    }
}
