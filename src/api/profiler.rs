//! The profiler handle.

use std::sync::Arc;
use std::time::Duration;

use crate::api::config::ProfileConfig;
use crate::api::record::ids;
use crate::api::scope::ScopeGuard;
use crate::api::sink::RecordSink;
use crate::api::stats::ProfileStats;
use crate::core::state::ProfilerCore;
use crate::drain::flatten;
use crate::drain::worker::DrainWorker;
use crate::platform::{Platform, StdPlatform};

/// The in-process profiler.
///
/// Cheap to clone (internally an `Arc`); clones share one block pool, one
/// root chain and one output stream. Instrumentation calls are no-ops until
/// [`enable`](Profiler::enable) and never block or fail: when the pool runs
/// dry, events are dropped and counted.
///
/// A thread must close all of its open blocks on one profiler before
/// opening blocks on another: the thread-local open-block slot indexes one
/// specific pool.
///
/// # Example
///
/// ```rust,no_run
/// use blockprof::{CollectingSink, ProfileConfig, Profiler};
/// use std::sync::Arc;
///
/// let sink = Arc::new(CollectingSink::new());
/// let profiler = Profiler::new(ProfileConfig::default());
/// profiler.set_output(Some(sink.clone()));
/// profiler.enable(true);
///
/// profiler.begin_block("frame");
/// profiler.log("loading level 3");
/// profiler.end_block();
///
/// profiler.finalize();
/// ```
#[derive(Clone)]
pub struct Profiler {
    core: Arc<ProfilerCore>,
}

impl Profiler {
    /// Create a profiler with the given configuration and the std platform.
    pub fn new(config: ProfileConfig) -> Self {
        Self::with_platform(config, Arc::new(StdPlatform::new()))
    }

    /// Create a profiler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ProfileConfig::default())
    }

    /// Create a profiler with an explicit [`Platform`] implementation,
    /// e.g. an engine clock or an OS hardware-thread query.
    pub fn with_platform(config: ProfileConfig, platform: Arc<dyn Platform>) -> Self {
        Self {
            core: Arc::new(ProfilerCore::new(config, platform)),
        }
    }

    pub(crate) fn core(&self) -> &ProfilerCore {
        &self.core
    }

    /// The configured stream identifier.
    pub fn identifier(&self) -> &str {
        self.core.identifier()
    }

    /// Enable or disable instrumentation. Idempotent.
    ///
    /// Turning the profiler on starts the drain thread; turning it off
    /// signals the drain, waits for it to flush everything pending and
    /// write the end-of-stream record, then joins it.
    pub fn enable(&self, enabled: bool) {
        let mut worker = self.core.worker.lock();
        let was = self.core.is_enabled();
        if enabled && !was {
            self.core.set_enabled(true);
            *worker = Some(DrainWorker::spawn(Arc::downgrade(&self.core)));
        } else if !enabled && was {
            if let Some(handle) = worker.take() {
                handle.stop();
            }
            self.core.set_enabled(false);
        }
    }

    /// Whether instrumentation is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.core.is_enabled()
    }

    /// Install the record sink, or remove it with `None`.
    ///
    /// Without a sink, records are still produced and recycled, just not
    /// emitted.
    pub fn set_output(&self, sink: Option<Arc<dyn RecordSink>>) {
        self.core.set_output(sink);
    }

    /// Set the drain period (clamped to at least 1 ms).
    pub fn set_output_wait(&self, wait: Duration) {
        self.core.set_output_wait(wait);
    }

    /// Open a nested timed scope on the calling thread.
    pub fn begin_block(&self, name: &str) {
        self.core.begin_block(name);
    }

    /// Close the calling thread's deepest open scope.
    ///
    /// Closing the outermost scope publishes the whole tree to the drain.
    pub fn end_block(&self) {
        self.core.end_block();
    }

    /// Mid-block check for hot loops: if the thread migrated to another
    /// hardware thread since the open block started, split it into two
    /// adjacent blocks with the same name.
    pub fn update_block(&self) {
        self.core.update_block();
    }

    /// Insert a frame demarcation marker carrying `counter`.
    pub fn end_frame(&self, counter: u64) {
        self.core.end_frame(counter);
    }

    /// Open a scope ended by dropping the returned guard.
    pub fn scope(&self, name: &str) -> ScopeGuard<'_> {
        ScopeGuard::new(self, name)
    }

    /// Record a log message. Messages longer than
    /// [`MAX_NAME_LENGTH`](crate::MAX_NAME_LENGTH) bytes are split across
    /// continuation records.
    pub fn log(&self, message: &str) {
        self.core.message_block(ids::LOG_MESSAGE, message.as_bytes());
    }

    /// Record a lock acquisition attempt.
    pub fn trylock(&self, name: &str) {
        self.core.message_block(ids::TRYLOCK, name.as_bytes());
    }

    /// Record a lock acquisition.
    pub fn lock(&self, name: &str) {
        self.core.message_block(ids::LOCK, name.as_bytes());
    }

    /// Record a lock release.
    pub fn unlock(&self, name: &str) {
        self.core.message_block(ids::UNLOCK, name.as_bytes());
    }

    /// Record a wait on a synchronization primitive.
    pub fn wait(&self, name: &str) {
        self.core.message_block(ids::WAIT, name.as_bytes());
    }

    /// Record a signal of a synchronization primitive.
    pub fn signal(&self, name: &str) {
        self.core.message_block(ids::SIGNAL, name.as_bytes());
    }

    /// Close every block the calling thread still has open, deepest first.
    ///
    /// Call before a producer thread exits with scopes still open.
    pub fn flush_thread(&self) {
        self.core.flush_thread();
    }

    /// Snapshot the profiler counters.
    pub fn stats(&self) -> ProfileStats {
        ProfileStats {
            capacity: self.core.pool.capacity(),
            dropped_events: self.core.dropped.load(std::sync::atomic::Ordering::Relaxed),
            enabled: self.core.is_enabled(),
        }
    }

    /// Shut the profiler down: disable (flushing the stream through the
    /// drain), close any blocks the calling thread left open, reclaim
    /// whatever remains and audit pool accounting.
    ///
    /// The trees reclaimed here are not emitted; the end-of-stream record
    /// written by the drain stays the last record. Accounting mismatches
    /// are reported as diagnostics, never panics. Blocks still open on
    /// other threads cannot be flushed from here and will show up as lost.
    pub fn finalize(&self) {
        self.enable(false);
        self.core.flush_thread();
        if self.core.has_pending_roots() {
            flatten::process_roots(&self.core, None);
        }
        self.core.audit_quiescent();
    }
}
