//! Record sinks: where serialized records go.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::api::record::{ProfileRecord, RECORD_SIZE};
use crate::sync::Mutex;

/// Consumer of the serialized record stream.
///
/// Invoked only from the drain thread, one full record image at a time, so
/// implementations may assume single-threaded access to the stream itself.
/// Writes must not fail upward; a sink that can fail has to absorb the
/// failure itself.
pub trait RecordSink: Send + Sync {
    /// Consume one record image.
    fn write(&self, record: &[u8; RECORD_SIZE]);
}

/// Sink that stores every record image, for tests and small captures.
pub struct CollectingSink {
    records: Mutex<Vec<[u8; RECORD_SIZE]>>,
}

impl CollectingSink {
    /// Create an empty collecting sink.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// All collected record images, in stream order.
    pub fn records(&self) -> Vec<[u8; RECORD_SIZE]> {
        self.records.lock().clone()
    }

    /// All collected records, parsed.
    pub fn parsed(&self) -> Vec<ProfileRecord> {
        self.records.lock().iter().map(ProfileRecord::parse).collect()
    }

    /// Number of records collected so far.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop everything collected so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for CollectingSink {
    fn write(&self, record: &[u8; RECORD_SIZE]) {
        self.records.lock().push(*record);
    }
}

/// Sink that only counts records.
#[derive(Default)]
pub struct CountingSink {
    count: AtomicU64,
}

impl CountingSink {
    /// Create a sink with a zero count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records written so far.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl RecordSink for CountingSink {
    fn write(&self, _record: &[u8; RECORD_SIZE]) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_stores_in_order() {
        let sink = CollectingSink::new();
        assert!(sink.is_empty());

        let mut record = [0u8; RECORD_SIZE];
        record[0] = 1;
        sink.write(&record);
        record[0] = 2;
        sink.write(&record);

        let parsed = sink.parsed();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, 1);
        assert_eq!(parsed[1].id, 2);

        sink.clear();
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn test_counting_sink() {
        let sink = CountingSink::new();
        sink.write(&[0u8; RECORD_SIZE]);
        sink.write(&[0u8; RECORD_SIZE]);
        assert_eq!(sink.count(), 2);
    }
}
