//! Order identifiers and the order record itself.
//!
//! Two shapes exist on purpose:
//! - [`OrderRequest`] is what a client submits: id, symbol, side,
//!   price, quantity. Nothing engine-assigned.
//! - [`Order`] is the accepted form: the request plus the remaining
//!   quantity and the engine-assigned arrival sequence.
//!
//! The arrival sequence is the canonical time-priority key. Wall-clock
//! timestamps are carried for the audit tape only and are never
//! consulted when ordering the book.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::price::{Price, Quantity};
use crate::side::Side;

/// Opaque, client-supplied order identifier.
///
/// The engine guarantees uniqueness across all live orders by
/// rejecting collisions; it never reassigns ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        OrderId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        OrderId(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        OrderId(id)
    }
}

/// A new-order request as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: Side,
    /// Limit price in ticks; must be strictly positive.
    pub price: Price,
    /// Quantity in whole units; must be strictly positive.
    pub quantity: Quantity,
}

impl OrderRequest {
    pub fn new(
        order_id: impl Into<OrderId>,
        symbol: impl Into<String>,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        OrderRequest {
            order_id: order_id.into(),
            symbol: symbol.into(),
            side,
            price,
            quantity,
        }
    }
}

/// An accepted limit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: Side,
    /// Limit price in ticks.
    pub price: Price,
    /// Quantity at acceptance.
    pub quantity: Quantity,
    /// Unfilled quantity; reaching zero retires the order.
    pub remaining: Quantity,
    /// Engine-assigned monotonic acceptance sequence; the time-priority
    /// tie-breaker within a price level. Reassigned on amend.
    pub arrival_sequence: u64,
    /// Wall-clock acceptance time in milliseconds, for audit output only.
    pub accepted_at_ms: i64,
}

impl Order {
    /// Build the accepted form of a request.
    pub(crate) fn accept(request: OrderRequest, arrival_sequence: u64, accepted_at_ms: i64) -> Self {
        Order {
            order_id: request.order_id,
            symbol: request.symbol,
            side: request.side,
            price: request.price,
            quantity: request.quantity,
            remaining: request.quantity,
            arrival_sequence,
            accepted_at_ms,
        }
    }

    /// True once the order has no remaining quantity.
    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Fill up to `qty` units; returns the quantity actually filled.
    pub(crate) fn fill(&mut self, qty: Quantity) -> Quantity {
        let filled = qty.min(self.remaining);
        self.remaining -= filled;
        filled
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OrderRequest {
        OrderRequest::new("ORD-1", "AAPL", Side::Buy, 1_000_000, 10)
    }

    #[test]
    fn accept_carries_request_fields() {
        let order = Order::accept(request(), 7, 1_700_000_000_000);
        assert_eq!(order.order_id.as_str(), "ORD-1");
        assert_eq!(order.remaining, 10);
        assert_eq!(order.quantity, 10);
        assert_eq!(order.arrival_sequence, 7);
    }

    #[test]
    fn fill_clamps_to_remaining() {
        let mut order = Order::accept(request(), 1, 0);
        assert_eq!(order.fill(4), 4);
        assert_eq!(order.remaining, 6);
        assert_eq!(order.fill(100), 6);
        assert!(order.is_filled());
    }

    #[test]
    fn order_id_serializes_as_bare_string() {
        let id = OrderId::new("ORD-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ORD-42\"");
    }
}
