//! Append-only JSONL event journal.
//!
//! One JSON object per line, in delivery order, written as the engine
//! publishes. The journal is the replay-friendly audit form: every
//! event kind appears, including rejections that the CSV tape skips.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use matchbook_core::{EngineEvent, EventSink, SinkError};

/// Failures while appending to the journal.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal encode: {0}")]
    Encode(#[from] serde_json::Error),
}

struct JournalFile {
    path: PathBuf,
    file: File,
}

/// JSONL event journal. Clones share one file handle and lock.
#[derive(Clone)]
pub struct EventJournal {
    inner: Arc<Mutex<JournalFile>>,
}

impl EventJournal {
    /// Open (or create) the journal at `path`, appending to existing
    /// content.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(EventJournal {
            inner: Arc::new(Mutex::new(JournalFile { path, file })),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.inner.lock().path.clone()
    }

    /// Append one event as a JSON line and flush it.
    pub fn append(&self, event: &EngineEvent) -> Result<(), JournalError> {
        let line = serde_json::to_string(event)?;
        let mut inner = self.inner.lock();
        writeln!(inner.file, "{line}")?;
        inner.file.flush()?;
        debug!(sequence = event.sequence(), "journaled event");
        Ok(())
    }

    /// Read every journaled event back, in append order.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<EngineEvent>, JournalError> {
        let text = std::fs::read_to_string(path)?;
        let mut events = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(line)?);
        }
        Ok(events)
    }
}

impl EventSink for EventJournal {
    fn publish(&mut self, event: &EngineEvent) -> Result<(), SinkError> {
        self.append(event).map_err(|e| Box::new(e) as SinkError)
    }
}
