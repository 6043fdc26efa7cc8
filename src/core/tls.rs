//! Thread-local scope stack state.
//!
//! Each thread tracks only the slot of its deepest currently-open block;
//! the rest of the open tree lives in the pool, linked through
//! `previous`/`sibling`/`child`. The slot indexes one specific pool, so a
//! thread must close all of its open blocks on one profiler before opening
//! blocks on another.

use std::cell::Cell;

thread_local! {
    /// Slot of the deepest open block on this thread, 0 if none.
    static CURRENT_BLOCK: Cell<u16> = const { Cell::new(0) };
}

/// Slot of the calling thread's deepest open block, 0 if none.
pub(crate) fn current_block() -> u16 {
    CURRENT_BLOCK.with(Cell::get)
}

/// Set the calling thread's deepest open block.
pub(crate) fn set_current_block(slot: u16) {
    CURRENT_BLOCK.with(|c| c.set(slot));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_block_roundtrip() {
        assert_eq!(current_block(), 0);
        set_current_block(17);
        assert_eq!(current_block(), 17);
        set_current_block(0);
        assert_eq!(current_block(), 0);
    }
}
