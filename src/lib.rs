//! # blockprof
//!
//! Low-overhead, in-process hierarchical profiler for applications and games.
//!
//! The profiler records timed, nested scopes from any number of threads into
//! a pre-allocated pool of fixed-size block records and streams serialized
//! records to a user-supplied sink from a background drain thread. A scope
//! costs a handful of atomic operations and stores, so instrumentation can
//! stay enabled in production-like builds.
//!
//! ## Features
//!
//! - Fixed pool of 64-byte block records addressed by 16-bit slots
//! - Lock-free ABA-tagged freelist; producers never block
//! - Per-thread nested scopes with thread-migration splitting
//! - Background drain thread streaming records to a [`RecordSink`]
//! - Message events (log, lock, wait, signal) with continuation chains
//! - Frame markers for frame-oriented workloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockprof::{ProfileConfig, Profiler};
//!
//! let profiler = Profiler::new(ProfileConfig::default());
//! profiler.enable(true);
//!
//! profiler.begin_block("update");
//! profiler.begin_block("physics");
//! profiler.end_block();
//! profiler.end_block();
//! profiler.end_frame(1);
//!
//! profiler.finalize();
//! ```

pub mod api;
pub mod diagnostics;
pub mod platform;

mod core;
mod drain;
mod pool;
mod sync;
mod util;

// Re-export the public API at the crate root for convenience
pub use api::config::ProfileConfig;
pub use api::profiler::Profiler;
pub use api::record::{
    ids, ProfileRecord, FIRST_SCOPE_ID, MAX_NAME_LENGTH, RECORD_DATA_SIZE, RECORD_SIZE,
};
pub use api::scope::ScopeGuard;
pub use api::sink::{CollectingSink, CountingSink, RecordSink};
pub use api::stats::ProfileStats;

pub use diagnostics::{suppress_diagnostics, Diagnostic, DiagnosticKind};
pub use platform::{Platform, StdPlatform};
