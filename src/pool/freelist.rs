//! Block pool with the ABA-tagged lock-free freelist.
//!
//! The freelist head is a single 32-bit word laid out as `[tag:16][index:16]`.
//! The tag comes from a shared loop counter bumped on every pop and push
//! attempt, so a compare-exchange that observes a recycled head index will
//! almost always observe a different tag.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::api::record::RECORD_SIZE;
use crate::pool::block::Block;

/// Highest slot count: slots are 16-bit and slot 0 is the null sentinel.
pub(crate) const MAX_BLOCKS: usize = 65535;

/// Pre-allocated array of block records plus the freelist threading them.
pub(crate) struct BlockPool {
    slots: Box<[UnsafeCell<Block>]>,
    /// Freelist head word `[tag:16][index:16]`; index 0 means empty.
    free: AtomicU32,
    /// Shared tag counter.
    loopid: AtomicU32,
}

// SAFETY: slots hold plain data. Cross-thread access is mediated by the
// freelist and root-chain compare-exchanges, which transfer exclusive block
// ownership; the one field readable without ownership (`child`) is atomic.
unsafe impl Send for BlockPool {}
unsafe impl Sync for BlockPool {}

impl BlockPool {
    /// Build a pool of `memory / 64` slots, capped at [`MAX_BLOCKS`], and
    /// thread the freelist 1 → 2 → … → last → 0. Slot 0 is reserved as
    /// "none" and never handed out.
    pub fn new(memory: usize) -> Self {
        let capacity = (memory / RECORD_SIZE).min(MAX_BLOCKS).max(1);
        let slots: Box<[UnsafeCell<Block>]> = (0..capacity)
            .map(|i| {
                let block = Block::zeroed();
                if i >= 1 && i + 1 < capacity {
                    block.child.store((i + 1) as u16, Ordering::Relaxed);
                }
                UnsafeCell::new(block)
            })
            .collect();
        let free = if capacity > 1 { 1 } else { 0 };
        Self {
            slots,
            free: AtomicU32::new(free),
            loopid: AtomicU32::new(0),
        }
    }

    /// Total slot count, including the reserved null slot.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Raw pointer to a slot.
    ///
    /// # Safety
    ///
    /// `slot` must be below [`BlockPool::capacity`]. Dereferencing any field
    /// other than `child` is only sound while the caller owns the block.
    pub unsafe fn get(&self, slot: u16) -> *mut Block {
        debug_assert!((slot as usize) < self.slots.len());
        self.slots[slot as usize].get()
    }

    fn child_of(&self, slot: u16) -> u16 {
        // SAFETY: `child` is atomic and may be read without owning the block.
        unsafe { (*self.get(slot)).child.load(Ordering::Relaxed) }
    }

    fn fresh_tag(&self) -> u32 {
        (self.loopid.fetch_add(1, Ordering::Relaxed) & 0xffff) << 16
    }

    /// Pop one block off the freelist and zero it.
    ///
    /// Returns `None` when the pool is exhausted; the caller decides how to
    /// report the drop.
    pub fn allocate(&self) -> Option<u16> {
        loop {
            let head = self.free.load(Ordering::Acquire);
            let slot = (head & 0xffff) as u16;
            if slot == 0 {
                return None;
            }
            let proposed = self.child_of(slot) as u32 | self.fresh_tag();
            if self
                .free
                .compare_exchange_weak(head, proposed, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                // SAFETY: the compare-exchange transferred the block to us.
                unsafe { (*self.get(slot)).reset() };
                return Some(slot);
            }
        }
    }

    /// Return a whole chain of blocks linked through `child`, from `head`
    /// down to `tail`, with a single compare-exchange.
    pub fn free_chain(&self, head: u16, tail: u16) {
        debug_assert!(head != 0 && tail != 0);
        loop {
            let tagged = head as u32 | self.fresh_tag();
            let last = self.free.load(Ordering::Acquire);
            // SAFETY: the caller owns the chain; only the tail link changes.
            unsafe {
                (*self.get(tail))
                    .child
                    .store((last & 0xffff) as u16, Ordering::Relaxed);
            }
            if self
                .free
                .compare_exchange_weak(last, tagged, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Walk the freelist and count what it reaches. Only meaningful at
    /// quiescence (no producers, drain stopped).
    pub fn audit(&self) -> PoolAudit {
        let mut free_blocks = 0u64;
        let mut linked_siblings = 0u64;
        let mut slot = (self.free.load(Ordering::Acquire) & 0xffff) as u16;
        while slot != 0 {
            // SAFETY: quiescent pool, nothing mutates blocks under us.
            let block = unsafe { &*self.get(slot) };
            if block.sibling != 0 {
                linked_siblings += 1;
            }
            free_blocks += 1;
            if free_blocks as usize > self.slots.len() {
                // Cycle in the freelist; bail out rather than spin.
                break;
            }
            slot = block.child.load(Ordering::Relaxed);
        }
        PoolAudit {
            capacity: self.slots.len(),
            free_blocks,
            linked_siblings,
        }
    }
}

/// Result of a quiescent freelist walk.
pub(crate) struct PoolAudit {
    pub capacity: usize,
    pub free_blocks: u64,
    pub linked_siblings: u64,
}

impl PoolAudit {
    /// Every slot accounted for: free blocks plus the reserved slot 0.
    pub fn is_consistent(&self) -> bool {
        self.free_blocks + 1 == self.capacity as u64 && self.linked_siblings == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_capacity_from_memory() {
        assert_eq!(BlockPool::new(64 * 10).capacity(), 10);
        assert_eq!(BlockPool::new(64 * 10 + 63).capacity(), 10);
        assert_eq!(BlockPool::new(64 * 100_000).capacity(), MAX_BLOCKS);
        // Too small for anything but the sentinel.
        assert_eq!(BlockPool::new(0).capacity(), 1);
    }

    #[test]
    fn test_allocate_until_exhausted() {
        let pool = BlockPool::new(64 * 4);
        let a = pool.allocate().expect("slot");
        let b = pool.allocate().expect("slot");
        let c = pool.allocate().expect("slot");
        assert_eq!(pool.allocate(), None);

        assert_ne!(a, 0);
        assert_ne!(b, 0);
        assert_ne!(c, 0);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_free_chain_recycles() {
        let pool = BlockPool::new(64 * 3);
        let slot = pool.allocate().expect("slot");
        assert!(pool.allocate().is_some());
        assert_eq!(pool.allocate(), None);

        pool.free_chain(slot, slot);
        assert_eq!(pool.allocate(), Some(slot));
    }

    #[test]
    fn test_audit_fresh_pool_consistent() {
        let pool = BlockPool::new(64 * 16);
        let audit = pool.audit();
        assert!(audit.is_consistent());
        assert_eq!(audit.free_blocks, 15);

        let slot = pool.allocate().expect("slot");
        assert!(!pool.audit().is_consistent());
        pool.free_chain(slot, slot);
        assert!(pool.audit().is_consistent());
    }

    #[test]
    fn test_sentinel_only_pool_never_allocates() {
        let pool = BlockPool::new(64);
        assert_eq!(pool.allocate(), None);
        assert!(pool.audit().is_consistent());
    }
}
