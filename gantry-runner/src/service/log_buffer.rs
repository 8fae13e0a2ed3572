//! Log buffer service
//!
//! Collects the log entries of one run. The buffer is written to by every
//! stage and drained once the run is over (or periodically by a caller that
//! streams logs).

use gantry_core::domain::log::LogEntry;
use std::sync::{Arc, Mutex};

/// Service for managing run log buffers
pub trait LogBufferService: Send + Sync {
    /// Adds a log entry to the buffer
    fn add_entry(&self, entry: LogEntry);

    /// Drains all log entries from the buffer
    ///
    /// Returns all buffered entries and clears the buffer.
    fn drain(&self) -> Vec<LogEntry>;
}

/// In-memory implementation of LogBufferService
///
/// Uses Arc<Mutex<Vec<LogEntry>>> for thread-safe access across tasks.
#[derive(Clone, Default)]
pub struct InMemoryLogBuffer {
    buffer: Arc<Mutex<Vec<LogEntry>>>,
}

impl InMemoryLogBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogBufferService for InMemoryLogBuffer {
    fn add_entry(&self, entry: LogEntry) {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.push(entry);
    }

    fn drain(&self) -> Vec<LogEntry> {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::domain::log::LogLevel;
    use gantry_core::domain::stage::StageKind;

    #[test]
    fn test_drain_empties_buffer() {
        let buffer = InMemoryLogBuffer::new();
        buffer.add_entry(LogEntry::new(LogLevel::Info, None, "test1"));
        buffer.add_entry(LogEntry::new(
            LogLevel::Error,
            Some(StageKind::Build),
            "test2",
        ));

        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].stage, Some(StageKind::Build));
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let buffer = InMemoryLogBuffer::new();
        let clone = buffer.clone();
        clone.add_entry(LogEntry::new(LogLevel::Debug, None, "shared"));
        assert_eq!(buffer.drain().len(), 1);
    }
}
