//! Host platform seam: clock, thread and processor queries.
//!
//! The block engine needs exactly four queries from its host. They enter
//! through the [`Platform`] trait so embedders can wire in an engine clock
//! or an OS hardware-thread query; [`StdPlatform`] covers everything
//! portable with std primitives.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Host queries used by the block engine.
pub trait Platform: Send + Sync {
    /// Current value of a monotonic tick counter.
    fn ticks(&self) -> i64;

    /// Rate of [`Platform::ticks`] in ticks per second.
    fn ticks_per_second(&self) -> i64;

    /// Identifier of the hardware thread currently executing the caller.
    fn processor(&self) -> u32;

    /// Stable identifier of the calling thread.
    fn thread_id(&self) -> u32;
}

/// Default platform backed by std.
///
/// Ticks are monotonic nanoseconds from an [`Instant`] epoch captured at
/// construction. Thread ids are small process-unique integers assigned on
/// first use. `processor` is always 0: std has no portable hardware-thread
/// query, so block splitting on core migration stays inert unless a custom
/// [`Platform`] provides one.
pub struct StdPlatform {
    epoch: Instant,
}

impl StdPlatform {
    /// Create a platform with its tick epoch at `now`.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for StdPlatform {
    fn ticks(&self) -> i64 {
        self.epoch.elapsed().as_nanos() as i64
    }

    fn ticks_per_second(&self) -> i64 {
        1_000_000_000
    }

    fn processor(&self) -> u32 {
        0
    }

    fn thread_id(&self) -> u32 {
        local_thread_id()
    }
}

static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(1);

thread_local! {
    static THREAD_ID: u32 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Process-unique identifier of the calling thread, assigned on first use.
pub fn local_thread_id() -> u32 {
    THREAD_ID.with(|id| *id)
}
