//! The trade record emitted by the matching loop.

use serde::{Deserialize, Serialize};

use crate::order::OrderId;
use crate::price::{Price, Quantity};

/// A match between one buy order and one sell order.
///
/// Trades are append-only: created by the matching loop, never mutated.
/// `price` is always the resting order's limit price (the maker sets
/// the print). `sequence` is the engine-global position of this trade
/// in the total event order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub symbol: String,
    pub price: Price,
    pub quantity: Quantity,
    pub sequence: u64,
    /// Wall-clock execution time in milliseconds, for audit output only.
    pub executed_at_ms: i64,
}
