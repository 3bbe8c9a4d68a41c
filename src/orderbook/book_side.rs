use std::collections::{BTreeMap, HashMap};

use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::price_level::PriceLevel;
use crate::orderbook::types::{Match, Order, OrderId, Price, PriceLevelInfo, Quantity, Side};

/// All price levels of one side of the book, ordered by price.
///
/// Bids are read from the top of the map, asks from the bottom, so the best
/// level is always an O(log n) lookup and walking in priority order never
/// re-sorts anything. Every level mutation goes through this type so the
/// side total stays exact, and empty levels are dropped on the spot.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    total_quantity: Quantity,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            total_quantity: 0,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Highest bid or lowest ask
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Bid => self.levels.keys().next_back().copied(),
            Side::Ask => self.levels.keys().next().copied(),
        }
    }

    /// Levels in matching priority: descending for bids, ascending for asks
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Bid => Box::new(self.levels.values().rev()),
            Side::Ask => Box::new(self.levels.values()),
        }
    }

    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Whether `quantity` more could rest on this side without the side
    /// total overflowing. Level totals never exceed the side total, so this
    /// also covers every level.
    pub fn can_rest(&self, quantity: Quantity) -> bool {
        self.total_quantity.checked_add(quantity).is_some()
    }

    /// Rest `order` at the back of the level at `price`, creating the level
    /// if needed.
    pub fn add_order(&mut self, price: Price, order: &mut Order) -> OrderBookResult<()> {
        let total = self
            .total_quantity
            .checked_add(order.remaining_quantity)
            .ok_or_else(|| {
                OrderBookError::InvalidOrder(format!(
                    "quantity {} overflows {} side volume",
                    order.remaining_quantity, self.side
                ))
            })?;

        let side = self.side;
        let level = self
            .levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(side, price));
        if let Err(e) = level.add_order(order) {
            if level.is_empty() {
                self.levels.remove(&price);
            }
            return Err(e);
        }
        self.total_quantity = total;
        Ok(())
    }

    /// Unlink a resting order from its level, dropping the level if it empties
    pub fn remove_order(&mut self, order: &mut Order) -> OrderBookResult<()> {
        let price = order.resting_at.ok_or_else(|| {
            OrderBookError::LogicViolation(format!("order {} is not resting", order.id))
        })?;
        let level = self.levels.get_mut(&price).ok_or_else(|| {
            OrderBookError::LogicViolation(format!(
                "order {} points at missing {} level {}",
                order.id, self.side, price
            ))
        })?;

        level.remove_order(order)?;
        self.total_quantity -= order.remaining_quantity;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Ok(())
    }

    /// Fill `incoming` against the level at `price` in FIFO order, dropping
    /// the level if it runs empty
    pub fn fill_level(
        &mut self,
        price: Price,
        incoming: &mut Order,
        orders: &mut HashMap<OrderId, Order>,
    ) -> OrderBookResult<Vec<Match>> {
        let level = self.levels.get_mut(&price).ok_or_else(|| {
            OrderBookError::LogicViolation(format!("{} level {} vanished", self.side, price))
        })?;

        let before = level.total_quantity();
        let matches = level.fill(incoming, orders)?;
        self.total_quantity -= before - level.total_quantity();

        if level.is_empty() {
            self.levels.remove(&price);
        }
        Ok(matches)
    }

    /// Sum of remaining quantity over every resting order on this side
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Aggregated view of the best `depth` levels
    pub fn depth(&self, depth: usize) -> Vec<PriceLevelInfo> {
        self.levels()
            .take(depth)
            .map(|level| {
                let (quantity, order_count) = level.get_depth_info();
                PriceLevelInfo {
                    price: level.price,
                    quantity,
                    order_count,
                }
            })
            .collect()
    }
}
