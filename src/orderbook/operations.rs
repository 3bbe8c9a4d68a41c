use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::orderbook::book::OrderBook;
use crate::orderbook::error::{OrderBookError, OrderBookResult};
use crate::orderbook::types::{LimitOrderOutcome, Match, Order, OrderId, Price, Quantity, Side};

/// A mutating request as it arrives from the service layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderRequest {
    Limit {
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Market {
        side: Side,
        quantity: Quantity,
    },
    Cancel {
        order_id: OrderId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderResponse {
    Limit(LimitOrderOutcome),
    Market(Vec<Match>),
    Cancelled(Order),
}

impl OrderResponse {
    /// Matches produced by the request, empty for cancels
    pub fn matches(&self) -> &[Match] {
        match self {
            OrderResponse::Limit(outcome) => &outcome.matches,
            OrderResponse::Market(matches) => matches,
            OrderResponse::Cancelled(_) => &[],
        }
    }
}

/// Order operations manager
pub struct OrderOperations;

impl OrderOperations {
    /// Validate and apply a single request to the book
    pub fn apply(book: &mut OrderBook, request: OrderRequest) -> OrderBookResult<OrderResponse> {
        debug!("Applying request: {:?}", request);

        Self::validate_request(&request)?;

        let result = match request {
            OrderRequest::Limit {
                side,
                price,
                quantity,
            } => book
                .submit_limit_order(side, price, quantity)
                .map(OrderResponse::Limit),
            OrderRequest::Market { side, quantity } => book
                .submit_market_order(side, quantity)
                .map(OrderResponse::Market),
            OrderRequest::Cancel { order_id } => {
                book.cancel_order(order_id).map(OrderResponse::Cancelled)
            }
        };

        if let Err(e) = &result {
            warn!("Request rejected on {}: {}", book.symbol, e);
        }
        result
    }

    /// Reject requests that can never be valid before they reach the book
    pub fn validate_request(request: &OrderRequest) -> OrderBookResult<()> {
        match request {
            OrderRequest::Limit {
                price, quantity, ..
            } => {
                if *price == 0 {
                    return Err(OrderBookError::InvalidOrder(
                        "price must be positive".to_string(),
                    ));
                }
                if *quantity == 0 {
                    return Err(OrderBookError::InvalidOrder(
                        "quantity must be positive".to_string(),
                    ));
                }
            }
            OrderRequest::Market { quantity, .. } => {
                if *quantity == 0 {
                    return Err(OrderBookError::InvalidOrder(
                        "quantity must be positive".to_string(),
                    ));
                }
            }
            OrderRequest::Cancel { .. } => {}
        }

        Ok(())
    }
}

/// Batch operations for high-performance scenarios
pub struct BatchOperations;

impl BatchOperations {
    /// Apply requests strictly in order; a failed request does not stop the batch
    pub fn process_batch(
        book: &mut OrderBook,
        requests: Vec<OrderRequest>,
    ) -> Vec<OrderBookResult<OrderResponse>> {
        requests
            .into_iter()
            .map(|request| OrderOperations::apply(book, request))
            .collect()
    }

    /// Cancel multiple orders in a batch
    pub fn cancel_batch(book: &mut OrderBook, order_ids: Vec<OrderId>) -> Vec<OrderBookResult<Order>> {
        order_ids
            .into_iter()
            .map(|order_id| book.cancel_order(order_id))
            .collect()
    }
}
