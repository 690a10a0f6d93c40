//! matchbook-tape
//!
//! Audit collaborators that consume the engine's event stream:
//! - [`Tape`]: the CSV files (orders / trades / cancelled)
//! - [`EventJournal`]: an append-only JSONL stream of every event
//! - [`Notifier`]: colored console notices plus a plain-text log
//!
//! All three implement `matchbook_core::EventSink` and compose through
//! `FanoutSink`. The engine itself never touches a file; everything
//! here observes transitions that have already happened.

pub mod journal;
pub mod notifier;
pub mod tape;

pub use journal::{EventJournal, JournalError};
pub use notifier::Notifier;
pub use tape::{Tape, TapeError, ORDERS_HEADER, TRADES_HEADER};
