//! Lifecycle and trade events, and the sink that observes them.
//!
//! The engine performs no I/O of its own; every externally visible
//! effect leaves through an [`EventSink`]. Delivery is synchronous and
//! ordered: the sink sees events in the exact order the engine's state
//! transitioned, and a mutating call does not return until every event
//! it produced has been offered to the sink.
//!
//! Sinks run *after* the mutation is complete, so a faulting sink can
//! never leave the book half-updated.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::order::{Order, OrderRequest};
use crate::trade::Trade;

/// Why a `place` request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    DuplicateOrderId,
    InvalidQuantity,
    InvalidPrice,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::DuplicateOrderId => "duplicate order id",
            RejectReason::InvalidQuantity => "invalid quantity",
            RejectReason::InvalidPrice => "invalid price",
        }
    }
}

/// One observed engine state transition.
///
/// `sequence` is the engine-global monotonic position of the
/// transition. For accepted/amended orders it equals the order's new
/// arrival sequence; for trades it equals the trade's own sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    OrderAccepted {
        sequence: u64,
        order: Order,
    },
    OrderRejected {
        sequence: u64,
        request: OrderRequest,
        reason: RejectReason,
    },
    OrderCancelled {
        sequence: u64,
        order: Order,
    },
    OrderAmended {
        sequence: u64,
        order: Order,
    },
    TradeExecuted {
        sequence: u64,
        trade: Trade,
    },
}

impl EngineEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            EngineEvent::OrderAccepted { sequence, .. }
            | EngineEvent::OrderRejected { sequence, .. }
            | EngineEvent::OrderCancelled { sequence, .. }
            | EngineEvent::OrderAmended { sequence, .. }
            | EngineEvent::TradeExecuted { sequence, .. } => *sequence,
        }
    }
}

/// Receiver for the engine's event stream.
///
/// Implementations own their side effects (files, terminals, queues)
/// and their own thread-safety. A returned error surfaces to the
/// caller of the engine operation as a sink failure; the state
/// transition it describes has already happened.
pub trait EventSink {
    fn publish(&mut self, event: &EngineEvent) -> Result<(), SinkError>;
}

/// Sink that discards everything. The default for an engine nobody is
/// observing, and handy in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: &EngineEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Cloneable in-memory sink. Every clone shares one buffer, so a test
/// (or tool) can hand one clone to the engine and inspect the stream
/// through another.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        BufferSink::default()
    }

    /// Snapshot of everything published so far.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().clone()
    }

    /// Drain the buffer, returning everything published so far.
    pub fn take(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for BufferSink {
    fn publish(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Composes several sinks into one, delivering to each in registration
/// order. The first failure aborts the fan-out and surfaces to the
/// engine; earlier sinks have already observed the event.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn EventSink + Send>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        FanoutSink::default()
    }

    pub fn with(mut self, sink: impl EventSink + Send + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: impl EventSink + Send + 'static) {
        self.sinks.push(Box::new(sink));
    }
}

impl EventSink for FanoutSink {
    fn publish(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        for sink in &mut self.sinks {
            sink.publish(event)?;
        }
        Ok(())
    }
}
