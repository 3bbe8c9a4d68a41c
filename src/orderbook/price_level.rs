use std::collections::{HashMap, VecDeque};

use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::types::{Match, Order, OrderId, Price, Quantity, Side};

/// Represents a price level in the order book
/// All orders at this price level maintain time priority (FIFO)
///
/// The level only stores order ids; the orders themselves live in the
/// book's arena and are passed in by the caller.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub side: Side,
    pub price: Price,
    orders: VecDeque<OrderId>,
    total_quantity: Quantity,
}

impl PriceLevel {
    pub fn new(side: Side, price: Price) -> Self {
        Self {
            side,
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    /// Add an order to this price level (maintains time priority)
    ///
    /// Fails without touching the level or the order if the level total
    /// would no longer fit in a `Quantity`.
    pub fn add_order(&mut self, order: &mut Order) -> OrderBookResult<()> {
        debug_assert_eq!(order.side, self.side);
        debug_assert!(order.remaining_quantity > 0, "filled orders never rest");

        let total = self
            .total_quantity
            .checked_add(order.remaining_quantity)
            .ok_or_else(|| {
                OrderBookError::InvalidOrder(format!(
                    "quantity {} overflows {} level {}",
                    order.remaining_quantity, self.side, self.price
                ))
            })?;

        order.resting_at = Some(self.price);
        self.orders.push_back(order.id);
        self.total_quantity = total;
        Ok(())
    }

    /// Remove an order by identity from this price level.
    ///
    /// The order must currently rest here; anything else means the book and
    /// the level have diverged and is reported as a logic violation.
    pub fn remove_order(&mut self, order: &mut Order) -> OrderBookResult<()> {
        if order.side != self.side || order.resting_at != Some(self.price) {
            return Err(OrderBookError::LogicViolation(format!(
                "order {} does not rest at {} level {}",
                order.id, self.side, self.price
            )));
        }

        let pos = self
            .orders
            .iter()
            .position(|id| *id == order.id)
            .ok_or_else(|| {
                OrderBookError::LogicViolation(format!(
                    "order {} missing from {} level {}",
                    order.id, self.side, self.price
                ))
            })?;

        self.orders.remove(pos);
        self.total_quantity -= order.remaining_quantity;
        order.resting_at = None;

        Ok(())
    }

    /// Match `incoming` against resting orders in FIFO order.
    ///
    /// Each resting order touched yields one match at this level's price.
    /// Filled orders always form a prefix of the queue and are popped as they
    /// fill. They stay in `orders`; dropping them from the arena is the
    /// book's job.
    pub fn fill(
        &mut self,
        incoming: &mut Order,
        orders: &mut HashMap<OrderId, Order>,
    ) -> OrderBookResult<Vec<Match>> {
        let mut matches = Vec::new();

        while !incoming.is_filled() {
            let Some(&resting_id) = self.orders.front() else {
                break;
            };

            let resting = orders.get_mut(&resting_id).ok_or_else(|| {
                OrderBookError::LogicViolation(format!(
                    "level {} references unknown order {}",
                    self.price, resting_id
                ))
            })?;

            let quantity = resting.remaining_quantity.min(incoming.remaining_quantity);
            resting.fill(quantity);
            incoming.fill(quantity);
            self.total_quantity -= quantity;

            matches.push(Match {
                maker_order_id: resting_id,
                taker_order_id: incoming.id,
                taker_side: incoming.side,
                price: self.price,
                quantity,
            });

            if resting.is_filled() {
                self.orders.pop_front();
                resting.resting_at = None;
            }
        }

        Ok(matches)
    }

    /// Id of the order first in line at this level
    pub fn peek_front(&self) -> Option<OrderId> {
        self.orders.front().copied()
    }

    /// Resting order ids in time priority
    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.orders.iter().copied()
    }

    /// Get total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Get number of orders at this price level
    pub fn order_count(&self) -> u32 {
        self.orders.len() as u32
    }

    /// Check if this price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get depth information for this level
    pub fn get_depth_info(&self) -> (Quantity, u32) {
        (self.total_quantity(), self.order_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_order(id: OrderId, side: Side, quantity: Quantity) -> Order {
        Order::new(id, side, quantity, id)
    }

    /// Builds a bid level at 10_000 with one resting order per quantity.
    fn level_with(quantities: &[Quantity]) -> (PriceLevel, HashMap<OrderId, Order>) {
        let mut level = PriceLevel::new(Side::Bid, 10_000);
        let mut arena = HashMap::new();
        for (i, qty) in quantities.iter().enumerate() {
            let mut order = create_test_order(i as OrderId + 1, Side::Bid, *qty);
            level.add_order(&mut order).unwrap();
            arena.insert(order.id, order);
        }
        (level, arena)
    }

    #[test]
    fn test_price_level_add_order() {
        let mut level = PriceLevel::new(Side::Bid, 10_000);
        let mut order = create_test_order(1, Side::Bid, 100);

        level.add_order(&mut order).unwrap();

        assert_eq!(level.total_quantity(), 100);
        assert_eq!(level.order_count(), 1);
        assert_eq!(order.resting_at, Some(10_000));
        assert!(!level.is_empty());
    }

    #[test]
    fn test_price_level_time_priority() {
        let (level, _) = level_with(&[100, 200]);

        assert_eq!(level.peek_front(), Some(1));
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_remove_order() {
        let (mut level, mut arena) = level_with(&[5, 8, 10]);

        let order = arena.get_mut(&2).unwrap();
        level.remove_order(order).unwrap();

        assert_eq!(order.resting_at, None);
        assert_eq!(level.total_quantity(), 15);
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_remove_foreign_order_is_logic_violation() {
        let (mut level, _) = level_with(&[5]);
        let mut stranger = create_test_order(99, Side::Bid, 5);

        let err = level.remove_order(&mut stranger).unwrap_err();
        assert!(matches!(err, OrderBookError::LogicViolation(_)));
        assert_eq!(level.total_quantity(), 5);

        // Claims to rest here but was never added.
        stranger.resting_at = Some(10_000);
        let err = level.remove_order(&mut stranger).unwrap_err();
        assert!(matches!(err, OrderBookError::LogicViolation(_)));
    }

    #[test]
    fn test_fill_partial_single_order() {
        let (mut level, mut arena) = level_with(&[100]);
        let mut incoming = create_test_order(50, Side::Ask, 40);

        let matches = level.fill(&mut incoming, &mut arena).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].quantity, 40);
        assert_eq!(matches[0].price, 10_000);
        assert_eq!(matches[0].maker_order_id, 1);
        assert_eq!(matches[0].taker_order_id, 50);
        assert!(incoming.is_filled());
        assert_eq!(level.total_quantity(), 60);
        assert_eq!(arena[&1].remaining_quantity, 60);
        assert_eq!(arena[&1].resting_at, Some(10_000));
    }

    #[test]
    fn test_fill_walks_fifo_and_unlinks_filled() {
        let (mut level, mut arena) = level_with(&[100, 200, 50]);
        let mut incoming = create_test_order(50, Side::Ask, 250);

        let matches = level.fill(&mut incoming, &mut arena).unwrap();

        let fills: Vec<_> = matches
            .iter()
            .map(|m| (m.maker_order_id, m.quantity))
            .collect();
        assert_eq!(fills, vec![(1, 100), (2, 150)]);
        assert_eq!(level.total_quantity(), 100);
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(arena[&1].resting_at, None);
        assert!(arena[&1].is_filled());
    }

    #[test]
    fn test_fill_exhausts_level() {
        let (mut level, mut arena) = level_with(&[3, 4]);
        let mut incoming = create_test_order(50, Side::Ask, 10);

        let matches = level.fill(&mut incoming, &mut arena).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(incoming.remaining_quantity, 3);
        assert!(level.is_empty());
        assert_eq!(level.total_quantity(), 0);
    }

    #[test]
    fn test_add_order_rejects_total_overflow() {
        let (mut level, _) = level_with(&[u64::MAX / 2 + 1]);
        let mut big = create_test_order(2, Side::Bid, u64::MAX / 2 + 1);

        let err = level.add_order(&mut big).unwrap_err();
        assert!(matches!(err, OrderBookError::InvalidOrder(_)));
        assert_eq!(big.resting_at, None);
        assert_eq!(level.order_count(), 1);
        assert_eq!(level.total_quantity(), u64::MAX / 2 + 1);

        // Exactly filling the quantity range is still fine
        let mut rest = create_test_order(3, Side::Bid, u64::MAX / 2);
        level.add_order(&mut rest).unwrap();
        assert_eq!(level.total_quantity(), u64::MAX);
    }

    #[test]
    fn test_fill_long_queue_front_to_back() {
        let (mut level, mut arena) = level_with(&[1; 1_000]);
        let mut incoming = create_test_order(5_000, Side::Ask, 999);

        let matches = level.fill(&mut incoming, &mut arena).unwrap();

        assert_eq!(matches.len(), 999);
        assert_eq!(matches.last().unwrap().maker_order_id, 999);
        assert_eq!(level.order_ids().collect::<Vec<_>>(), vec![1_000]);
        assert_eq!(level.total_quantity(), 1);
    }
}
