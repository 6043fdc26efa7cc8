//! Shared profiler state and the producer-side block engine.
//!
//! Everything producers touch on the hot path is an atomic or a
//! thread-owned block; the mutexes below guard only cold-path state (the
//! installed sink and the drain worker handle).

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::config::ProfileConfig;
use crate::api::record::{ids, FIRST_SCOPE_ID, MAX_NAME_LENGTH};
use crate::api::sink::RecordSink;
use crate::core::tls;
use crate::diagnostics::{self, BP001, BP002, BP101, BP201, BP202, BP203};
use crate::drain::worker::DrainWorker;
use crate::platform::Platform;
use crate::pool::block::significant_name;
use crate::pool::freelist::{BlockPool, MAX_BLOCKS};
use crate::sync::Mutex;

/// State shared by every clone of a profiler handle.
pub(crate) struct ProfilerCore {
    pub pool: BlockPool,
    /// Head slot of the completed-tree chain awaiting drain, 0 if empty.
    root: AtomicU32,
    /// Shared counter issuing scope ids and message sequence numbers.
    counter: AtomicI32,
    enabled: AtomicBool,
    /// Tick value captured at construction; all timestamps are relative.
    ground_time: i64,
    identifier: String,
    pub platform: Arc<dyn Platform>,
    sink: Mutex<Option<Arc<dyn RecordSink>>>,
    /// Drain period in milliseconds, at least 1.
    output_wait_ms: AtomicU64,
    /// Events dropped on pool exhaustion.
    pub dropped: AtomicU64,
    exhausted_warned: AtomicBool,
    pub worker: Mutex<Option<DrainWorker>>,
}

impl ProfilerCore {
    pub fn new(config: ProfileConfig, platform: Arc<dyn Platform>) -> Self {
        let pool = BlockPool::new(config.memory);
        let ground_time = platform.ticks();
        let wait_ms = clamp_wait(config.output_wait);
        Self {
            pool,
            root: AtomicU32::new(0),
            counter: AtomicI32::new(FIRST_SCOPE_ID),
            enabled: AtomicBool::new(false),
            ground_time,
            identifier: config.identifier,
            platform,
            sink: Mutex::new(None),
            output_wait_ms: AtomicU64::new(wait_ms),
            dropped: AtomicU64::new(0),
            exhausted_warned: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn set_output(&self, sink: Option<Arc<dyn RecordSink>>) {
        *self.sink.lock() = sink;
    }

    pub fn current_sink(&self) -> Option<Arc<dyn RecordSink>> {
        self.sink.lock().clone()
    }

    pub fn set_output_wait(&self, wait: Duration) {
        self.output_wait_ms.store(clamp_wait(wait), Ordering::Relaxed);
    }

    pub fn output_wait(&self) -> Duration {
        Duration::from_millis(self.output_wait_ms.load(Ordering::Relaxed))
    }

    fn timestamp(&self) -> i64 {
        self.platform.ticks() - self.ground_time
    }

    fn next_counter(&self) -> i32 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Pop a block, counting and warning (once) on exhaustion.
    fn allocate_block(&self) -> Option<u16> {
        match self.pool.allocate() {
            Some(slot) => Some(slot),
            None => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if self
                    .exhausted_warned
                    .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    if self.pool.capacity() < MAX_BLOCKS {
                        diagnostics::emit(&BP001);
                    } else {
                        diagnostics::emit(&BP002);
                    }
                }
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tree insertion
    // -------------------------------------------------------------------------

    /// Attach a completed block (with any subtree it carries) under the
    /// current open block, or publish it as a root when none is open.
    fn put_simple_block(&self, slot: u16) {
        let parent = tls::current_block();
        if parent != 0 {
            // SAFETY: both blocks belong to this thread's open tree.
            unsafe {
                let block = self.pool.get(slot);
                let parentblock = self.pool.get(parent);
                let next = (*parentblock).child.load(Ordering::Relaxed);
                (*block).previous = parent;
                (*block).sibling = next;
                if next != 0 {
                    (*self.pool.get(next)).previous = slot;
                }
                (*parentblock).child.store(slot, Ordering::Relaxed);
            }
        } else {
            self.publish_root(slot);
        }
    }

    /// Publish a completed top-level tree to the drain chain.
    ///
    /// Tries to install `slot` as the chain head; when another publisher or
    /// the drain got there first, steals the current chain, splices it
    /// behind our own sibling chain and retries. The swap-to-zero before
    /// re-installing makes the protocol immune to recycled indices.
    fn publish_root(&self, slot: u16) {
        while self
            .root
            .compare_exchange(0, slot as u32, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            let mut stolen;
            loop {
                stolen = (self.root.load(Ordering::Acquire) & 0xffff) as u16;
                if stolen == 0 {
                    break;
                }
                if self
                    .root
                    .compare_exchange(stolen as u32, 0, Ordering::AcqRel, Ordering::Relaxed)
                    .is_ok()
                {
                    break;
                }
            }
            if stolen != 0 {
                // SAFETY: we own `slot`'s chain, and the exchange above
                // transferred the stolen chain to us.
                unsafe {
                    let block = self.pool.get(slot);
                    if (*block).sibling != 0 {
                        let mut leaf = (*block).sibling;
                        while (*self.pool.get(leaf)).sibling != 0 {
                            leaf = (*self.pool.get(leaf)).sibling;
                        }
                        (*self.pool.get(stolen)).previous = leaf;
                        (*self.pool.get(leaf)).sibling = stolen;
                    } else {
                        (*block).sibling = stolen;
                    }
                }
            }
        }
    }

    /// Detach the whole pending chain; drain side of the handoff.
    pub fn detach_roots(&self) -> u16 {
        loop {
            let head = (self.root.load(Ordering::Acquire) & 0xffff) as u16;
            if head == 0 {
                return 0;
            }
            if self
                .root
                .compare_exchange(head as u32, 0, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return head;
            }
        }
    }

    pub fn has_pending_roots(&self) -> bool {
        self.root.load(Ordering::Acquire) != 0
    }

    // -------------------------------------------------------------------------
    // Producer operations
    // -------------------------------------------------------------------------

    /// Open a nested timed scope. Returns whether a block was opened.
    pub fn begin_block(&self, name: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.begin_block_bytes(name.as_bytes())
    }

    fn begin_block_bytes(&self, name: &[u8]) -> bool {
        let parent = tls::current_block();
        let Some(slot) = self.allocate_block() else {
            return false;
        };
        // SAFETY: the freelist pop transferred the block to us; the parent
        // chain is owned by this thread.
        unsafe {
            let block = self.pool.get(slot);
            (*block).id = self.next_counter();
            (*block).processor = self.platform.processor();
            (*block).thread = self.platform.thread_id();
            (*block).start = self.timestamp();
            (*block).set_name(name);
            if parent != 0 {
                let parentblock = self.pool.get(parent);
                (*block).parentid = (*parentblock).id;
                let next = (*parentblock).child.load(Ordering::Relaxed);
                (*block).previous = parent;
                (*block).sibling = next;
                if next != 0 {
                    (*self.pool.get(next)).previous = slot;
                }
                (*parentblock).child.store(slot, Ordering::Relaxed);
            }
        }
        tls::set_current_block(slot);
        true
    }

    /// Close the deepest open scope on this thread.
    pub fn end_block(&self) {
        if !self.is_enabled() {
            return;
        }
        self.end_block_inner();
    }

    /// Close the deepest open scope regardless of the enabled flag. Shared
    /// by the public path and the thread-cleanup walk.
    pub(crate) fn end_block_inner(&self) {
        let slot = tls::current_block();
        if slot == 0 {
            return;
        }
        // SAFETY: the open chain from `slot` up to its thread root is owned
        // by this thread.
        unsafe {
            let block = self.pool.get(slot);
            (*block).end = self.timestamp();

            if (*block).previous != 0 {
                // Walk the sibling list backwards until `previous` names the
                // block whose child list we head; that block is the parent.
                let mut current_index = slot;
                let mut current = block;
                let mut previous = self.pool.get((*current).previous);
                while (*previous).child.load(Ordering::Relaxed) != current_index {
                    current_index = (*current).previous;
                    current = self.pool.get(current_index);
                    previous = self.pool.get((*current).previous);
                }
                let parent_index = (*current).previous;
                tls::set_current_block(parent_index);

                let parent = self.pool.get(parent_index);
                if self.is_enabled() && (*parent).processor != self.platform.processor() {
                    // The thread migrated since the parent started: close the
                    // parent too and reopen it as an adjacent segment. Copy
                    // the name out first; ending a thread root publishes the
                    // block and the drain may recycle it immediately.
                    let name = (*parent).name;
                    self.end_block_inner();
                    self.begin_block_bytes(significant_name(&name));
                }
            } else {
                self.publish_root(slot);
                tls::set_current_block(0);
            }
        }
    }

    /// Mid-block migration check for hot loops: when the hardware thread no
    /// longer matches the open block, split it into adjacent segments.
    pub fn update_block(&self) {
        if !self.is_enabled() {
            return;
        }
        let slot = tls::current_block();
        if slot == 0 {
            return;
        }
        // SAFETY: the open block is owned by this thread.
        unsafe {
            let block = self.pool.get(slot);
            if (*block).processor == self.platform.processor() {
                return;
            }
            let name = (*block).name;
            self.end_block_inner();
            self.begin_block_bytes(significant_name(&name));
        }
    }

    /// Record a message event (log, lock, wait, signal), splitting long
    /// messages into continuation blocks chained by sequence number.
    pub fn message_block(&self, id: i32, message: &[u8]) {
        if !self.is_enabled() {
            return;
        }
        let Some(head) = self.allocate_block() else {
            return;
        };
        // SAFETY: every block below is freshly allocated and exclusively
        // ours until `put_simple_block` attaches the head.
        unsafe {
            let headblock = self.pool.get(head);
            (*headblock).id = id;
            (*headblock).processor = self.platform.processor();
            (*headblock).thread = self.platform.thread_id();
            (*headblock).start = self.timestamp();
            (*headblock).end = self.next_counter() as i64;
            (*headblock).set_name(message);

            let mut rest = message.get(MAX_NAME_LENGTH..).unwrap_or(&[]);
            let mut tail = head;
            while !rest.is_empty() {
                let Some(cont) = self.allocate_block() else {
                    // Out of blocks mid-chain: attach what we have, the
                    // message arrives truncated instead of leaking.
                    break;
                };
                let tailblock = self.pool.get(tail);
                let contblock = self.pool.get(cont);
                (*contblock).id = id + 1;
                (*contblock).parentid = (*tailblock).end as i32;
                (*contblock).processor = (*headblock).processor;
                (*contblock).thread = (*headblock).thread;
                (*contblock).start = (*headblock).start;
                (*contblock).end = self.next_counter() as i64;
                (*contblock).set_name(rest);

                (*contblock).sibling = (*tailblock).child.load(Ordering::Relaxed);
                if (*contblock).sibling != 0 {
                    (*self.pool.get((*contblock).sibling)).previous = cont;
                }
                (*tailblock).child.store(cont, Ordering::Relaxed);
                (*contblock).previous = tail;
                tail = cont;

                rest = rest.get(MAX_NAME_LENGTH..).unwrap_or(&[]);
            }
        }
        self.put_simple_block(head);
    }

    /// Insert a frame demarcation marker carrying the caller's counter.
    pub fn end_frame(&self, counter: u64) {
        if !self.is_enabled() {
            return;
        }
        let Some(slot) = self.allocate_block() else {
            return;
        };
        // SAFETY: the freelist pop transferred the block to us.
        unsafe {
            let block = self.pool.get(slot);
            (*block).id = ids::END_FRAME;
            (*block).processor = self.platform.processor();
            (*block).thread = self.platform.thread_id();
            (*block).start = self.timestamp();
            (*block).end = counter as i64;
        }
        self.put_simple_block(slot);
    }

    // -------------------------------------------------------------------------
    // Cleanup
    // -------------------------------------------------------------------------

    /// Close every block the calling thread still has open, deepest first.
    ///
    /// If two consecutive iterations observe the same slot the chain is
    /// self-referencing; warn and abandon the walk.
    pub fn flush_thread(&self) {
        let mut last = 0u16;
        loop {
            let slot = tls::current_block();
            if slot == 0 {
                break;
            }
            if slot == last {
                diagnostics::emit(&BP101);
                break;
            }
            self.end_block_inner();
            last = slot;
        }
    }

    /// Verify pool accounting at quiescence; mismatches warn, never abort.
    pub fn audit_quiescent(&self) {
        let audit = self.pool.audit();
        if audit.is_consistent() && !self.has_pending_roots() {
            return;
        }
        if self.has_pending_roots() {
            diagnostics::emit(&BP202);
        }
        if audit.linked_siblings != 0 {
            diagnostics::emit_with_context(
                &BP203,
                &format!("{} free blocks with sibling links", audit.linked_siblings),
            );
        }
        if audit.free_blocks + 1 != audit.capacity as u64 {
            diagnostics::emit_with_context(
                &BP201,
                &format!(
                    "found {} of {} blocks",
                    audit.free_blocks + 1,
                    audit.capacity
                ),
            );
        }
    }
}

fn clamp_wait(wait: Duration) -> u64 {
    (wait.as_millis().min(u64::MAX as u128) as u64).max(1)
}
