//! Single-symbol order book with price-time priority.
//!
//! One instance per symbol:
//! - Bids: descending by price (best = highest).
//! - Asks: ascending by price (best = lowest).
//! - FIFO (arrival-sequence order) within each price level.
//!
//! Alongside the two side books the book keeps an id index mapping
//! each resting order to its `(side, price)` location, so cancels and
//! amends find their level in O(log n) instead of walking the book.
//! The index and the queues must move together: every insert, retire,
//! and excision updates both.

use std::collections::HashMap;

use crate::depth::BookDepth;
use crate::error::EngineError;
use crate::order::{now_ms, Order, OrderId};
use crate::price::{Price, Quantity};
use crate::sequencer::Sequencer;
use crate::side::Side;
use crate::side_book::SideBook;
use crate::trade::Trade;

/// Single-symbol order book.
#[derive(Debug)]
pub struct OrderBook {
    symbol: String,
    bids: SideBook,
    asks: SideBook,
    /// Location of every resting order, for amend/cancel lookup. Never
    /// owns the order; the queues do.
    index: HashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        OrderBook {
            symbol: symbol.into(),
            bids: SideBook::new(Side::Buy),
            asks: SideBook::new(Side::Sell),
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// True if an order with this id is resting in this book.
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Number of resting orders across both sides.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Process an accepted incoming order: match it against the
    /// opposing side while it crosses, then rest any remainder.
    ///
    /// Returns the trades in the order they were generated. The caller
    /// has already verified the id is globally unused; the book still
    /// refuses a local collision defensively.
    pub fn add_order(
        &mut self,
        mut order: Order,
        seq: &mut Sequencer,
    ) -> Result<Vec<Trade>, EngineError> {
        if self.index.contains_key(&order.order_id) {
            return Err(EngineError::DuplicateOrderId(order.order_id));
        }

        let trades = self.match_incoming(&mut order, seq);
        if order.remaining > 0 {
            self.rest(order);
        }
        Ok(trades)
    }

    /// Remove a resting order. Returns the order as it rested (with
    /// its unfilled remainder), or `None` for an unknown id.
    pub fn cancel_order(&mut self, order_id: &OrderId) -> Option<Order> {
        let (side, price) = self.index.remove(order_id)?;
        let removed = match side {
            Side::Buy => self.bids.remove(price, order_id),
            Side::Sell => self.asks.remove(price, order_id),
        };
        debug_assert!(removed.is_some(), "id index out of sync with queues");
        removed
    }

    /// Amend as unconditional cancel-plus-new: the order keeps its id
    /// and side, takes the new price and quantity, and receives a
    /// fresh arrival sequence, forfeiting its queue position. If the
    /// amended order crosses, it matches immediately.
    ///
    /// Returns the amended order as re-accepted (pre-match) and any
    /// trades the re-entry produced.
    pub fn amend_order(
        &mut self,
        order_id: &OrderId,
        new_price: Price,
        new_quantity: Quantity,
        seq: &mut Sequencer,
    ) -> Result<(Order, Vec<Trade>), EngineError> {
        let existing = self
            .cancel_order(order_id)
            .ok_or_else(|| EngineError::UnknownOrder(order_id.clone()))?;

        let mut order = Order {
            order_id: existing.order_id,
            symbol: existing.symbol,
            side: existing.side,
            price: new_price,
            quantity: new_quantity,
            remaining: new_quantity,
            arrival_sequence: seq.next_sequence(),
            accepted_at_ms: now_ms(),
        };
        let amended = order.clone();

        let trades = self.match_incoming(&mut order, seq);
        if order.remaining > 0 {
            self.rest(order);
        }
        Ok((amended, trades))
    }

    /// Borrow a resting order by id.
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let (side, price) = self.index.get(order_id)?;
        match side {
            Side::Buy => self.bids.find(*price, order_id),
            Side::Sell => self.asks.find(*price, order_id),
        }
    }

    /// Clone out every resting order. Enumeration order is
    /// unspecified; callers needing a stable order sort on
    /// `arrival_sequence`.
    pub fn all_orders(&self) -> Vec<Order> {
        let mut all = self.bids.orders();
        all.extend(self.asks.orders());
        all
    }

    /// Stable aggregated view of both sides for rendering.
    pub fn depth(&self) -> BookDepth {
        BookDepth {
            symbol: self.symbol.clone(),
            bids: self.bids.depth(),
            asks: self.asks.depth(),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Run the matching loop with `taker` as the aggressor.
    ///
    /// While the taker has quantity and the opposing best price is
    /// compatible, fill against the head of the best opposing level.
    /// The trade always prints at the resting order's price, and a
    /// fully filled resting order leaves the id index with its queue.
    fn match_incoming(&mut self, taker: &mut Order, seq: &mut Sequencer) -> Vec<Trade> {
        let mut trades = Vec::new();
        let symbol = self.symbol.clone();

        while taker.remaining > 0 {
            let opposing = match taker.side {
                Side::Buy => &mut self.asks,
                Side::Sell => &mut self.bids,
            };

            let Some(maker_price) = opposing.best_price() else {
                break;
            };
            let compatible = match taker.side {
                Side::Buy => maker_price <= taker.price,
                Side::Sell => maker_price >= taker.price,
            };
            if !compatible {
                break;
            }

            let Some(maker) = opposing.best() else {
                break;
            };
            let maker_id = maker.order_id.clone();
            let qty = taker.remaining.min(maker.remaining);

            let (buy_order_id, sell_order_id) = match taker.side {
                Side::Buy => (taker.order_id.clone(), maker_id),
                Side::Sell => (maker_id, taker.order_id.clone()),
            };
            trades.push(Trade {
                trade_id: seq.next_trade_id(),
                buy_order_id,
                sell_order_id,
                symbol: symbol.clone(),
                price: maker_price,
                quantity: qty,
                sequence: seq.next_sequence(),
                executed_at_ms: now_ms(),
            });

            taker.fill(qty);
            let retired = opposing.reduce_head(qty);
            if let Some(retired) = retired {
                self.index.remove(&retired.order_id);
            }
        }

        trades
    }

    /// Rest a remainder in its side book and record its location.
    fn rest(&mut self, order: Order) {
        self.index
            .insert(order.order_id.clone(), (order.side, order.price));
        match order.side {
            Side::Buy => self.bids.insert(order),
            Side::Sell => self.asks.insert(order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderRequest;

    fn accepted(
        seq: &mut Sequencer,
        id: &str,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Order {
        Order::accept(
            OrderRequest::new(id, "X", side, price, qty),
            seq.next_sequence(),
            0,
        )
    }

    #[test]
    fn incoming_rests_when_nothing_crosses() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        let trades = book
            .add_order(accepted(&mut seq, "B1", Side::Buy, 100, 10), &mut seq)
            .unwrap();
        assert!(trades.is_empty());
        assert!(book.contains(&OrderId::new("B1")));
        assert_eq!(book.best_bid(), Some(100));
    }

    #[test]
    fn full_fill_empties_both_sides_and_the_index() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "B1", Side::Buy, 100, 10), &mut seq)
            .unwrap();
        let trades = book
            .add_order(accepted(&mut seq, "S1", Side::Sell, 95, 10), &mut seq)
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 100);
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(book.order_count(), 0);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn partial_fill_keeps_the_maker_with_its_remainder() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "S1", Side::Sell, 100, 10), &mut seq)
            .unwrap();
        let trades = book
            .add_order(accepted(&mut seq, "B1", Side::Buy, 100, 4), &mut seq)
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 4);
        let maker = book.get(&OrderId::new("S1")).unwrap();
        assert_eq!(maker.remaining, 6);
        assert!(!book.contains(&OrderId::new("B1")));
    }

    #[test]
    fn aggressor_walks_levels_in_price_order() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "S1", Side::Sell, 101, 5), &mut seq)
            .unwrap();
        book.add_order(accepted(&mut seq, "S2", Side::Sell, 100, 5), &mut seq)
            .unwrap();
        let trades = book
            .add_order(accepted(&mut seq, "B1", Side::Buy, 101, 8), &mut seq)
            .unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].sell_order_id.as_str(), "S2");
        assert_eq!(trades[0].price, 100);
        assert_eq!(trades[1].sell_order_id.as_str(), "S1");
        assert_eq!(trades[1].price, 101);
        assert_eq!(book.get(&OrderId::new("S1")).unwrap().remaining, 2);
    }

    #[test]
    fn duplicate_id_in_same_book_is_refused() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "B1", Side::Buy, 100, 10), &mut seq)
            .unwrap();
        let err = book
            .add_order(accepted(&mut seq, "B1", Side::Buy, 90, 5), &mut seq)
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateOrderId(_)));
        assert_eq!(book.get(&OrderId::new("B1")).unwrap().price, 100);
    }

    #[test]
    fn cancel_removes_and_repeated_cancel_is_none() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "B1", Side::Buy, 100, 10), &mut seq)
            .unwrap();
        let cancelled = book.cancel_order(&OrderId::new("B1")).unwrap();
        assert_eq!(cancelled.remaining, 10);
        assert!(book.cancel_order(&OrderId::new("B1")).is_none());
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn amend_moves_the_order_to_the_back_of_its_level() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "B1", Side::Buy, 100, 10), &mut seq)
            .unwrap();
        book.add_order(accepted(&mut seq, "B2", Side::Buy, 100, 10), &mut seq)
            .unwrap();

        let (amended, trades) = book
            .amend_order(&OrderId::new("B1"), 100, 10, &mut seq)
            .unwrap();
        assert!(trades.is_empty());
        assert!(amended.arrival_sequence > book.get(&OrderId::new("B2")).unwrap().arrival_sequence);

        let hit = book
            .add_order(accepted(&mut seq, "S1", Side::Sell, 100, 10), &mut seq)
            .unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].buy_order_id.as_str(), "B2");
    }

    #[test]
    fn amend_that_crosses_matches_immediately() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");

        book.add_order(accepted(&mut seq, "S1", Side::Sell, 105, 10), &mut seq)
            .unwrap();
        book.add_order(accepted(&mut seq, "B1", Side::Buy, 100, 10), &mut seq)
            .unwrap();

        let (_, trades) = book
            .amend_order(&OrderId::new("B1"), 105, 10, &mut seq)
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 105);
        assert_eq!(book.order_count(), 0);
    }

    #[test]
    fn amend_unknown_id_is_an_error() {
        let mut seq = Sequencer::new();
        let mut book = OrderBook::new("X");
        let err = book
            .amend_order(&OrderId::new("nope"), 100, 10, &mut seq)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownOrder(_)));
    }
}
