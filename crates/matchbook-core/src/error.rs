//! Error types surfaced by the engine.
//!
//! The engine reports every failure to its immediate caller and does
//! nothing else with it: no logging, no printing, no retries. What to
//! do with a rejection belongs to the collaborators.

use thiserror::Error;

use crate::order::OrderId;
use crate::price::{Price, Quantity};

/// Boxed error produced by an event sink.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of the public engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A `place` whose id collides with a live order anywhere in the
    /// engine. No state change.
    #[error("duplicate order id: {0}")]
    DuplicateOrderId(OrderId),

    /// Amend for an id not resting in any book. No state change.
    #[error("unknown order id: {0}")]
    UnknownOrder(OrderId),

    /// Non-positive quantity. No state change.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(Quantity),

    /// Non-positive price. No state change.
    #[error("invalid price: {0}")]
    InvalidPrice(Price),

    /// An event sink failed while observing an already-completed state
    /// transition. The mutation stands; only the observation pipeline
    /// may be lossy.
    #[error("event sink failure: {0}")]
    Sink(#[source] SinkError),
}
