//! Single-owner matching task.
//!
//! [`Engine::spawn`] moves an [`OrderBook`] into a tokio task. Every request
//! and query travels through one bounded queue and is handled to completion
//! before the next one is read, so callers holding an [`EngineHandle`] never
//! observe a book mid-mutation.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::metrics::OrderBookMetrics;
use crate::orderbook::operations::{OrderOperations, OrderRequest, OrderResponse};
use crate::orderbook::{
    BookSnapshot, LimitOrderOutcome, Match, Order, OrderBook, OrderBookError, OrderBookResult,
    OrderBookStats, OrderId, Price, Quantity, Side,
};

type ReadFn = Box<dyn FnOnce(&OrderBook) + Send>;

pub enum Command {
    Request {
        request: OrderRequest,
        reply: oneshot::Sender<OrderBookResult<OrderResponse>>,
    },
    Read(ReadFn),
    Shutdown,
}

pub struct Engine {
    book: OrderBook,
    metrics: Option<Arc<OrderBookMetrics>>,
    commands: mpsc::Receiver<Command>,
}

impl Engine {
    /// Start the owner task. The join handle yields the book once the engine
    /// is shut down or every handle is dropped.
    pub fn spawn(
        book: OrderBook,
        buffer: usize,
        metrics: Option<Arc<OrderBookMetrics>>,
    ) -> (EngineHandle, JoinHandle<OrderBook>) {
        let (sender, commands) = mpsc::channel(buffer);
        let engine = Engine {
            book,
            metrics,
            commands,
        };

        (EngineHandle { sender }, tokio::spawn(engine.run()))
    }

    async fn run(mut self) -> OrderBook {
        info!("Matching engine started for {}", self.book.symbol);

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Request { request, reply } => {
                    let result = self.handle(request);
                    if reply.send(result).is_err() {
                        debug!("Caller went away before the reply was sent");
                    }
                }
                Command::Read(read) => read(&self.book),
                Command::Shutdown => break,
            }
        }

        info!(
            "Matching engine stopped for {} with {} resting orders",
            self.book.symbol,
            self.book.total_orders()
        );
        self.book
    }

    fn handle(&mut self, request: OrderRequest) -> OrderBookResult<OrderResponse> {
        let Some(metrics) = self.metrics.clone() else {
            return OrderOperations::apply(&mut self.book, request);
        };

        let book = &mut self.book;
        let result = match request {
            r @ OrderRequest::Limit { .. } => {
                metrics.increment_limit_orders();
                metrics.time_limit_order(|| OrderOperations::apply(book, r))
            }
            r @ OrderRequest::Market { .. } => {
                metrics.increment_market_orders();
                metrics.time_market_order(|| OrderOperations::apply(book, r))
            }
            r @ OrderRequest::Cancel { .. } => {
                let result = metrics.time_cancel_order(|| OrderOperations::apply(book, r));
                if result.is_ok() {
                    metrics.increment_orders_cancelled();
                }
                result
            }
        };

        match &result {
            Ok(response) => metrics.record_matches(response.matches()),
            Err(_) => metrics.increment_orders_rejected(),
        }
        metrics.update_book_state(&self.book.stats());

        result
    }
}

/// Cloneable handle for talking to a running [`Engine`]
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Command>,
}

impl EngineHandle {
    pub async fn submit(&self, request: OrderRequest) -> OrderBookResult<OrderResponse> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Request { request, reply }).await?;
        response.await.map_err(|_| reply_dropped())?
    }

    pub async fn place_limit_order(
        &self,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> OrderBookResult<LimitOrderOutcome> {
        match self
            .submit(OrderRequest::Limit {
                side,
                price,
                quantity,
            })
            .await?
        {
            OrderResponse::Limit(outcome) => Ok(outcome),
            other => Err(unexpected(other)),
        }
    }

    pub async fn place_market_order(&self, side: Side, quantity: Quantity) -> OrderBookResult<Vec<Match>> {
        match self.submit(OrderRequest::Market { side, quantity }).await? {
            OrderResponse::Market(matches) => Ok(matches),
            other => Err(unexpected(other)),
        }
    }

    pub async fn cancel_order(&self, order_id: OrderId) -> OrderBookResult<Order> {
        match self.submit(OrderRequest::Cancel { order_id }).await? {
            OrderResponse::Cancelled(order) => Ok(order),
            other => Err(unexpected(other)),
        }
    }

    /// Run a read-only query against the book between two mutations
    pub async fn read<F, R>(&self, query: F) -> OrderBookResult<R>
    where
        F: FnOnce(&OrderBook) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let read: ReadFn = Box::new(move |book| {
            let _ = reply.send(query(book));
        });
        self.send(Command::Read(read)).await?;
        response.await.map_err(|_| reply_dropped())
    }

    pub async fn best_bid(&self) -> OrderBookResult<Option<Price>> {
        self.read(OrderBook::best_bid).await
    }

    pub async fn best_ask(&self) -> OrderBookResult<Option<Price>> {
        self.read(OrderBook::best_ask).await
    }

    pub async fn bid_total_volume(&self) -> OrderBookResult<Quantity> {
        self.read(OrderBook::bid_total_volume).await
    }

    pub async fn ask_total_volume(&self) -> OrderBookResult<Quantity> {
        self.read(OrderBook::ask_total_volume).await
    }

    pub async fn snapshot(&self, depth: usize) -> OrderBookResult<BookSnapshot> {
        self.read(move |book| book.snapshot(depth)).await
    }

    pub async fn stats(&self) -> OrderBookResult<OrderBookStats> {
        self.read(OrderBook::stats).await
    }

    /// Ask the engine to stop after the commands already queued
    pub async fn shutdown(&self) -> OrderBookResult<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> OrderBookResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| OrderBookError::SystemError("matching engine is not running".to_string()))
    }
}

fn reply_dropped() -> OrderBookError {
    OrderBookError::SystemError("matching engine dropped the request".to_string())
}

fn unexpected(response: OrderResponse) -> OrderBookError {
    OrderBookError::SystemError(format!("unexpected engine response: {:?}", response))
}
