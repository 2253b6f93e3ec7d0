//! Periodic snapshot scheduling for the persistence collaborator.
//!
//! The embedding shell owns the timer and the storage backend; this type
//! only decides *when* a snapshot should be taken and produces the
//! serialized payload. It never mutates the document.

use crate::document::Document;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Tracks dirtiness and cadence for best-effort document snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotScheduler {
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl Default for SnapshotScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotScheduler {
    pub fn new() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark the document as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True when the document is dirty and the interval has elapsed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Periodic timer tick: returns a serialized snapshot when due.
    pub fn on_tick(&mut self, doc: &Document) -> Option<String> {
        if !self.should_save() {
            return None;
        }
        self.take(doc)
    }

    /// Window-blur: best-effort snapshot outside the timer cadence.
    pub fn on_blur(&mut self, doc: &Document) -> Option<String> {
        if !self.dirty {
            return None;
        }
        self.take(doc)
    }

    fn take(&mut self, doc: &Document) -> Option<String> {
        match doc.serialize() {
            Ok(raw) => {
                self.last_save = Some(Instant::now());
                self.dirty = false;
                Some(raw)
            }
            Err(err) => {
                log::error!("autosave snapshot failed: {err}");
                None
            }
        }
    }
}
