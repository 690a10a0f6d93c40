//! Aggregated depth views for rendering and export.
//!
//! A depth snapshot is a stable copy: it shares no state with the live
//! book and stays valid however the book mutates afterwards.

use serde::{Deserialize, Serialize};

use crate::price::{Price, Quantity};

/// One price level, aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub total_quantity: Quantity,
    pub order_count: u32,
}

/// Both sides of one symbol's book, best level first on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDepth {
    pub symbol: String,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

impl BookDepth {
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|l| l.price)
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
