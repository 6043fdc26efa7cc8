//! The serialized record stream.
//!
//! The drain thread hands the installed [`RecordSink`](crate::RecordSink)
//! one fixed-size record image per block. The first [`RECORD_DATA_SIZE`]
//! bytes are the defined payload; the trailing 6 bytes are in-pool link
//! state that writers should preserve for forward compatibility. Images are
//! in native byte order (little-endian on the supported targets).

/// Size of one full record image handed to a sink.
pub const RECORD_SIZE: usize = 64;

/// Size of the defined serialized payload at the front of a record image.
pub const RECORD_DATA_SIZE: usize = 58;

/// Number of significant bytes in a record name. Longer messages are split
/// across continuation records.
pub const MAX_NAME_LENGTH: usize = 25;

/// First identifier handed out for user scopes; everything below is
/// reserved for system records.
pub const FIRST_SCOPE_ID: i32 = 128;

/// Reserved record identifiers.
///
/// Continuation records of a split message use the base identifier plus
/// one, and carry their predecessor's sequence number in `parentid`.
pub mod ids {
    /// Emitted last, on shutdown; the record is all zeroes.
    pub const END_OF_STREAM: i32 = 0;
    /// Periodic system info; `start` holds the tick rate, name is "sysinfo".
    pub const SYSTEM_INFO: i32 = 1;
    /// User log message.
    pub const LOG_MESSAGE: i32 = 2;
    /// Frame demarcation marker; `end` holds the user-supplied counter.
    pub const END_FRAME: i32 = 4;
    /// Lock instrumentation events; the name is the lock name.
    pub const TRYLOCK: i32 = 5;
    /// See [`TRYLOCK`].
    pub const LOCK: i32 = 7;
    /// See [`TRYLOCK`].
    pub const UNLOCK: i32 = 9;
    /// Synchronization primitive wait; the name is the primitive name.
    pub const WAIT: i32 = 11;
    /// See [`WAIT`].
    pub const SIGNAL: i32 = 12;
}

/// Parsed view of one record image.
///
/// Field semantics depend on the record id: for message records `end` is a
/// sequence number rather than a tick and continuations carry their
/// predecessor's sequence number in `parentid`; the sysinfo record carries
/// the tick rate in `start`; the end-of-frame record carries the frame
/// counter in `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Record kind: a reserved id below [`FIRST_SCOPE_ID`], or a scope id.
    pub id: i32,
    /// Scope id of the enclosing scope, 0 at top level; for continuation
    /// records the predecessor's sequence number.
    pub parentid: i32,
    /// Hardware thread captured when the block started.
    pub processor: u32,
    /// Producing thread identifier.
    pub thread: u32,
    /// Start tick relative to ground time.
    pub start: i64,
    /// End tick relative to ground time, or a sequence number / counter.
    pub end: i64,
    /// NUL-terminated name field.
    pub name: [u8; MAX_NAME_LENGTH + 1],
}

impl ProfileRecord {
    /// Decode the serialized payload of a record image.
    pub fn parse(record: &[u8; RECORD_SIZE]) -> Self {
        let mut name = [0u8; MAX_NAME_LENGTH + 1];
        name.copy_from_slice(&record[32..58]);
        Self {
            id: i32::from_ne_bytes(field(record, 0)),
            parentid: i32::from_ne_bytes(field(record, 4)),
            processor: u32::from_ne_bytes(field(record, 8)),
            thread: u32::from_ne_bytes(field(record, 12)),
            start: i64::from_ne_bytes(field(record, 16)),
            end: i64::from_ne_bytes(field(record, 24)),
            name,
        }
    }

    /// Significant bytes of the name, up to the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        &self.name[..len]
    }

    /// Name as a string, lossy on invalid UTF-8.
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    /// Whether this is a user scope record (id ≥ [`FIRST_SCOPE_ID`]).
    pub fn is_scope(&self) -> bool {
        self.id >= FIRST_SCOPE_ID
    }
}

fn field<const N: usize>(record: &[u8; RECORD_SIZE], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&record[at..at + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let mut image = [0u8; RECORD_SIZE];
        image[0..4].copy_from_slice(&200i32.to_ne_bytes());
        image[4..8].copy_from_slice(&130i32.to_ne_bytes());
        image[8..12].copy_from_slice(&3u32.to_ne_bytes());
        image[12..16].copy_from_slice(&7u32.to_ne_bytes());
        image[16..24].copy_from_slice(&1_000i64.to_ne_bytes());
        image[24..32].copy_from_slice(&2_000i64.to_ne_bytes());
        image[32..37].copy_from_slice(b"hello");

        let record = ProfileRecord::parse(&image);
        assert_eq!(record.id, 200);
        assert_eq!(record.parentid, 130);
        assert_eq!(record.processor, 3);
        assert_eq!(record.thread, 7);
        assert_eq!(record.start, 1_000);
        assert_eq!(record.end, 2_000);
        assert_eq!(record.name_bytes(), b"hello");
        assert!(record.is_scope());
    }

    #[test]
    fn test_full_name_has_no_nul() {
        let mut image = [0u8; RECORD_SIZE];
        image[32..58].copy_from_slice(&[b'x'; 26]);
        let record = ProfileRecord::parse(&image);
        assert_eq!(record.name_bytes().len(), 26);
    }
}
