//! matchbook-core
//!
//! Pure price-time priority matching logic for a single venue:
//! - value types (orders, trades, events)
//! - per-side price-indexed FIFO books
//! - per-symbol order book with the matching loop
//! - multi-symbol engine with global id uniqueness
//! - the event sink interface collaborators observe the engine through
//!
//! The crate performs no I/O and never logs; every externally visible
//! effect leaves through the [`EventSink`].

pub mod depth;
pub mod engine;
pub mod error;
pub mod events;
pub mod order;
pub mod order_book;
pub mod price;
pub mod sequencer;
pub mod side;
pub mod side_book;
pub mod trade;

pub use depth::{BookDepth, DepthLevel};
pub use engine::Engine;
pub use error::{EngineError, SinkError};
pub use events::{BufferSink, EngineEvent, EventSink, FanoutSink, NullSink, RejectReason};
pub use order::{Order, OrderId, OrderRequest};
pub use price::{Price, Quantity, PRICE_SCALE};
pub use side::Side;
pub use side_book::SideBook;
pub use trade::Trade;

pub use order_book::OrderBook;
