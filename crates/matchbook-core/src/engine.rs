//! Multi-symbol engine: routing, identity, and event delivery.
//!
//! The engine owns one [`OrderBook`] per symbol (created on first
//! reference), the monotonic counters behind every sequence and trade
//! id, and an engine-global `order id -> symbol` index so amend and
//! cancel resolve their book in O(1) instead of scanning the
//! directory.
//!
//! All mutating operations take `&mut self`: single-writer dispatch is
//! enforced by ownership, and callers that share an engine across
//! threads serialize through their own lock. Every mutation runs to
//! completion — including the full cascade of trades it triggers —
//! before its events are offered to the sink, so no observer ever sees
//! a half-matched book.

use std::collections::HashMap;

use crate::depth::BookDepth;
use crate::error::EngineError;
use crate::events::{EngineEvent, EventSink, NullSink, RejectReason};
use crate::order::{now_ms, Order, OrderId, OrderRequest};
use crate::order_book::OrderBook;
use crate::price::{Price, Quantity};
use crate::sequencer::Sequencer;
use crate::trade::Trade;

/// Multi-symbol matching engine.
pub struct Engine {
    books: HashMap<String, OrderBook>,
    /// Which book each live order rests in. Kept in lockstep with the
    /// per-book indexes: entries appear when an order rests and vanish
    /// on cancel or full fill.
    order_to_symbol: HashMap<OrderId, String>,
    seq: Sequencer,
    sink: Box<dyn EventSink + Send>,
}

impl Engine {
    /// Engine with no observers.
    pub fn new() -> Self {
        Engine::with_sink(NullSink)
    }

    /// Engine publishing its event stream to `sink`.
    pub fn with_sink(sink: impl EventSink + Send + 'static) -> Self {
        Engine {
            books: HashMap::new(),
            order_to_symbol: HashMap::new(),
            seq: Sequencer::new(),
            sink: Box::new(sink),
        }
    }

    /// Accept, match, and possibly rest a new order.
    ///
    /// On acceptance the order receives the next arrival sequence, the
    /// matching loop runs to exhaustion, and the returned trades are
    /// in generation order. Validation failures reject the request
    /// without touching any book.
    pub fn place(&mut self, request: OrderRequest) -> Result<Vec<Trade>, EngineError> {
        if request.quantity == 0 {
            return self.reject(request, RejectReason::InvalidQuantity);
        }
        if request.price == 0 {
            return self.reject(request, RejectReason::InvalidPrice);
        }
        if self.order_to_symbol.contains_key(&request.order_id) {
            return self.reject(request, RejectReason::DuplicateOrderId);
        }

        let order = Order::accept(request, self.seq.next_sequence(), now_ms());
        let symbol = order.symbol.clone();
        let accepted = order.clone();

        let book = self
            .books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol.clone()));
        let trades = book.add_order(order, &mut self.seq)?;

        self.sync_identity(&symbol, &accepted.order_id, &trades);

        let mut events = Vec::with_capacity(1 + trades.len());
        events.push(EngineEvent::OrderAccepted {
            sequence: accepted.arrival_sequence,
            order: accepted,
        });
        events.extend(trades.iter().cloned().map(|trade| EngineEvent::TradeExecuted {
            sequence: trade.sequence,
            trade,
        }));
        self.deliver(&events)?;

        Ok(trades)
    }

    /// Amend a live order: unconditional cancel-plus-new under the
    /// same id, with queue priority forfeited. May cross and trade.
    pub fn amend(
        &mut self,
        order_id: &OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> Result<Vec<Trade>, EngineError> {
        if new_quantity == 0 {
            return Err(EngineError::InvalidQuantity(new_quantity));
        }
        if new_price == 0 {
            return Err(EngineError::InvalidPrice(new_price));
        }
        let symbol = self
            .order_to_symbol
            .get(order_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownOrder(order_id.clone()))?;
        let book = self
            .books
            .get_mut(&symbol)
            .ok_or_else(|| EngineError::UnknownOrder(order_id.clone()))?;

        let (amended, trades) = book.amend_order(order_id, new_price, new_quantity, &mut self.seq)?;

        self.sync_identity(&symbol, order_id, &trades);

        let mut events = Vec::with_capacity(1 + trades.len());
        events.push(EngineEvent::OrderAmended {
            sequence: amended.arrival_sequence,
            order: amended,
        });
        events.extend(trades.iter().cloned().map(|trade| EngineEvent::TradeExecuted {
            sequence: trade.sequence,
            trade,
        }));
        self.deliver(&events)?;

        Ok(trades)
    }

    /// Cancel a live order. Returns `Ok(false)` for an unknown id: the
    /// request is a no-op and emits nothing.
    pub fn cancel(&mut self, order_id: &OrderId) -> Result<bool, EngineError> {
        let Some(symbol) = self.order_to_symbol.get(order_id).cloned() else {
            return Ok(false);
        };
        let Some(book) = self.books.get_mut(&symbol) else {
            self.order_to_symbol.remove(order_id);
            return Ok(false);
        };

        match book.cancel_order(order_id) {
            Some(order) => {
                self.order_to_symbol.remove(order_id);
                let sequence = self.seq.next_sequence();
                self.deliver(&[EngineEvent::OrderCancelled { sequence, order }])?;
                Ok(true)
            }
            None => {
                self.order_to_symbol.remove(order_id);
                Ok(false)
            }
        }
    }

    /// Stable depth view of one symbol's book. `None` means no such
    /// book; a read never creates one.
    pub fn snapshot(&self, symbol: &str) -> Option<BookDepth> {
        self.books.get(symbol).map(OrderBook::depth)
    }

    /// Every live order across all books, in unspecified order.
    pub fn all_orders(&self) -> Vec<Order> {
        self.books.values().flat_map(OrderBook::all_orders).collect()
    }

    /// Borrow a live order by id.
    pub fn order(&self, order_id: &OrderId) -> Option<&Order> {
        let symbol = self.order_to_symbol.get(order_id)?;
        self.books.get(symbol)?.get(order_id)
    }

    /// True if an order with this id is live anywhere in the engine.
    pub fn contains_order(&self, order_id: &OrderId) -> bool {
        self.order_to_symbol.contains_key(order_id)
    }

    /// Number of symbols with a book (live or emptied).
    pub fn num_symbols(&self) -> usize {
        self.books.len()
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Emit an `OrderRejected` event and surface the matching error.
    /// The rejection outcome takes precedence over a sink fault during
    /// its own delivery.
    fn reject(
        &mut self,
        request: OrderRequest,
        reason: RejectReason,
    ) -> Result<Vec<Trade>, EngineError> {
        let err = match reason {
            RejectReason::DuplicateOrderId => {
                EngineError::DuplicateOrderId(request.order_id.clone())
            }
            RejectReason::InvalidQuantity => EngineError::InvalidQuantity(request.quantity),
            RejectReason::InvalidPrice => EngineError::InvalidPrice(request.price),
        };
        let sequence = self.seq.next_sequence();
        let _ = self.deliver(&[EngineEvent::OrderRejected {
            sequence,
            request,
            reason,
        }]);
        Err(err)
    }

    /// Reconcile the engine-global id index with the book after an
    /// operation: the incoming id is tracked iff it rested, and any
    /// counterparty fully consumed by the trades is dropped.
    fn sync_identity(&mut self, symbol: &str, incoming: &OrderId, trades: &[Trade]) {
        let Some(book) = self.books.get(symbol) else {
            return;
        };
        if book.contains(incoming) {
            self.order_to_symbol
                .insert(incoming.clone(), symbol.to_string());
        } else {
            self.order_to_symbol.remove(incoming);
        }
        for trade in trades {
            for id in [&trade.buy_order_id, &trade.sell_order_id] {
                if id != incoming && !book.contains(id) {
                    self.order_to_symbol.remove(id);
                }
            }
        }
    }

    /// Offer events to the sink in transition order. State is already
    /// fully mutated by the time this runs; a sink fault stops the
    /// remaining deliveries and surfaces as [`EngineError::Sink`].
    fn deliver(&mut self, events: &[EngineEvent]) -> Result<(), EngineError> {
        for event in events {
            self.sink.publish(event).map_err(EngineError::Sink)?;
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Side;

    fn req(id: &str, symbol: &str, side: Side, price: Price, qty: Quantity) -> OrderRequest {
        OrderRequest::new(id, symbol, side, price, qty)
    }

    #[test]
    fn books_are_created_on_first_reference() {
        let mut engine = Engine::new();
        assert_eq!(engine.num_symbols(), 0);
        engine
            .place(req("B1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        engine.place(req("S1", "MSFT", Side::Sell, 50, 5)).unwrap();
        assert_eq!(engine.num_symbols(), 2);
    }

    #[test]
    fn snapshot_never_creates_a_book() {
        let mut engine = Engine::new();
        assert!(engine.snapshot("AAPL").is_none());
        engine
            .place(req("B1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        assert!(engine.snapshot("AAPL").is_some());
        assert!(engine.snapshot("MSFT").is_none());
        assert_eq!(engine.num_symbols(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected_across_symbols() {
        let mut engine = Engine::new();
        engine
            .place(req("ORD-1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        let err = engine
            .place(req("ORD-1", "MSFT", Side::Sell, 50, 5))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateOrderId(_)));
        assert!(engine.snapshot("MSFT").is_none());
    }

    #[test]
    fn an_id_is_reusable_after_its_order_leaves_the_book() {
        let mut engine = Engine::new();
        engine
            .place(req("ORD-1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        engine
            .place(req("ORD-2", "AAPL", Side::Sell, 100, 10))
            .unwrap();
        // ORD-1 was fully consumed, so its id is free again.
        engine
            .place(req("ORD-1", "AAPL", Side::Buy, 90, 1))
            .unwrap();
        assert!(engine.contains_order(&OrderId::new("ORD-1")));
    }

    #[test]
    fn zero_price_and_quantity_are_rejected_defensively() {
        let mut engine = Engine::new();
        assert!(matches!(
            engine.place(req("B1", "AAPL", Side::Buy, 0, 10)),
            Err(EngineError::InvalidPrice(0))
        ));
        assert!(matches!(
            engine.place(req("B2", "AAPL", Side::Buy, 100, 0)),
            Err(EngineError::InvalidQuantity(0))
        ));
        assert_eq!(engine.num_symbols(), 0);
    }

    #[test]
    fn cancel_unknown_is_false_and_emits_nothing() {
        let mut engine = Engine::new();
        assert!(!engine.cancel(&OrderId::new("nope")).unwrap());
    }

    #[test]
    fn cancel_twice_is_true_then_false() {
        let mut engine = Engine::new();
        engine
            .place(req("B1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        assert!(engine.cancel(&OrderId::new("B1")).unwrap());
        assert!(!engine.cancel(&OrderId::new("B1")).unwrap());
    }

    #[test]
    fn amend_routes_through_the_global_index() {
        let mut engine = Engine::new();
        engine
            .place(req("B1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        engine.place(req("S1", "MSFT", Side::Sell, 50, 5)).unwrap();

        engine.amend(&OrderId::new("B1"), 101, 10).unwrap();
        let order = engine.order(&OrderId::new("B1")).unwrap();
        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.price, 101);

        assert!(matches!(
            engine.amend(&OrderId::new("ghost"), 1, 1),
            Err(EngineError::UnknownOrder(_))
        ));
    }

    #[test]
    fn fully_filled_orders_drop_out_of_the_global_index() {
        let mut engine = Engine::new();
        engine
            .place(req("B1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        engine
            .place(req("S1", "AAPL", Side::Sell, 100, 10))
            .unwrap();
        assert!(!engine.contains_order(&OrderId::new("B1")));
        assert!(!engine.contains_order(&OrderId::new("S1")));
        assert!(!engine.cancel(&OrderId::new("B1")).unwrap());
    }

    #[test]
    fn arrival_sequences_follow_program_order() {
        let mut engine = Engine::new();
        engine
            .place(req("B1", "AAPL", Side::Buy, 100, 10))
            .unwrap();
        engine.place(req("B2", "MSFT", Side::Buy, 90, 10)).unwrap();
        let first = engine.order(&OrderId::new("B1")).unwrap().arrival_sequence;
        let second = engine.order(&OrderId::new("B2")).unwrap().arrival_sequence;
        assert!(first < second);
    }
}
