//! Fixed-size block records.
//!
//! One block is one event: a timed scope, a message, a frame marker. The
//! first 58 bytes are the serialized payload; the last 6 bytes are the
//! in-pool links that thread blocks into trees, sibling chains and the
//! freelist.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::api::record::{MAX_NAME_LENGTH, RECORD_SIZE};

/// Length of the NUL-terminated name field.
pub(crate) const NAME_FIELD_LENGTH: usize = MAX_NAME_LENGTH + 1;

/// One pool slot.
///
/// `child` points to the most recently inserted child while the block is
/// busy and doubles as the freelist link while it is free. It is the only
/// field a thread that does not own the block may observe (a stale freelist
/// pop racing the owner), so every access goes through the atomic. All
/// other fields are owned exclusively by whichever side currently holds the
/// block: the producing thread, the root chain publisher, or the drain.
#[repr(C)]
pub(crate) struct Block {
    pub id: i32,
    pub parentid: i32,
    pub processor: u32,
    pub thread: u32,
    pub start: i64,
    pub end: i64,
    pub name: [u8; NAME_FIELD_LENGTH],
    pub previous: u16,
    pub sibling: u16,
    pub child: AtomicU16,
}

const _: () = assert!(std::mem::size_of::<Block>() == RECORD_SIZE);
const _: () = assert!(std::mem::align_of::<Block>() == 8);

impl Block {
    /// An all-zero block.
    pub(crate) const fn zeroed() -> Self {
        Self {
            id: 0,
            parentid: 0,
            processor: 0,
            thread: 0,
            start: 0,
            end: 0,
            name: [0; NAME_FIELD_LENGTH],
            previous: 0,
            sibling: 0,
            child: AtomicU16::new(0),
        }
    }

    /// Zero every field after the block comes off the freelist.
    ///
    /// `child` is stored atomically: a contender that loaded a stale
    /// freelist head may still read it while we reset.
    pub(crate) fn reset(&mut self) {
        self.id = 0;
        self.parentid = 0;
        self.processor = 0;
        self.thread = 0;
        self.start = 0;
        self.end = 0;
        self.name = [0; NAME_FIELD_LENGTH];
        self.previous = 0;
        self.sibling = 0;
        self.child.store(0, Ordering::Relaxed);
    }

    /// Copy up to [`MAX_NAME_LENGTH`] bytes of `name`, NUL-terminated.
    pub(crate) fn set_name(&mut self, name: &[u8]) {
        let len = name.len().min(MAX_NAME_LENGTH);
        self.name[..len].copy_from_slice(&name[..len]);
        self.name[len..].fill(0);
    }

    /// The full record image handed to a sink.
    ///
    /// The caller must own the block exclusively; `child`'s storage is read
    /// non-atomically here.
    pub(crate) fn record_image(&self) -> [u8; RECORD_SIZE] {
        // SAFETY: Block is repr(C), exactly RECORD_SIZE bytes with no
        // padding (every field sits at its natural alignment).
        unsafe { *(self as *const Block as *const [u8; RECORD_SIZE]) }
    }
}

/// Significant bytes of a name field, up to the first NUL.
pub(crate) fn significant_name(name: &[u8; NAME_FIELD_LENGTH]) -> &[u8] {
    let len = name.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_LENGTH);
    &name[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_record_layout() {
        assert_eq!(offset_of!(Block, id), 0);
        assert_eq!(offset_of!(Block, parentid), 4);
        assert_eq!(offset_of!(Block, processor), 8);
        assert_eq!(offset_of!(Block, thread), 12);
        assert_eq!(offset_of!(Block, start), 16);
        assert_eq!(offset_of!(Block, end), 24);
        assert_eq!(offset_of!(Block, name), 32);
        assert_eq!(offset_of!(Block, previous), 58);
        assert_eq!(offset_of!(Block, sibling), 60);
        assert_eq!(offset_of!(Block, child), 62);
    }

    #[test]
    fn test_set_name_truncates() {
        let mut block = Block::zeroed();
        block.set_name(&[b'a'; 40]);
        assert_eq!(significant_name(&block.name), &[b'a'; 25][..]);
        assert_eq!(block.name[25], 0);

        block.set_name(b"short");
        assert_eq!(significant_name(&block.name), b"short");
    }

    #[test]
    fn test_record_image_matches_fields() {
        let mut block = Block::zeroed();
        block.id = 42;
        block.end = 7;
        block.set_name(b"image");
        let image = block.record_image();
        assert_eq!(&image[0..4], &42i32.to_ne_bytes());
        assert_eq!(&image[24..32], &7i64.to_ne_bytes());
        assert_eq!(&image[32..37], b"image");
    }
}
