//! The drain worker thread.
//!
//! A dedicated thread wakes on a timeout (or an exit signal), detaches the
//! pending root chain, streams every tree through the installed sink and
//! recycles the blocks. Its own work is wrapped in `profile_io` / `process`
//! scopes so the drain's cost shows up in the trace like everything else.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Weak;
use std::thread::{self, JoinHandle};

use crate::api::record::ids;
use crate::core::state::ProfilerCore;
use crate::drain::flatten;
use crate::pool::block::Block;

/// Number of non-empty wakes between sysinfo records.
const SYSINFO_INTERVAL: u32 = 11;

/// Handle to a running drain thread.
pub(crate) struct DrainWorker {
    exit: Sender<()>,
    thread: JoinHandle<()>,
}

impl DrainWorker {
    /// Spawn the worker. It holds the core weakly so dropping every
    /// profiler handle lets it exit on its next wake instead of leaking.
    pub fn spawn(core: Weak<ProfilerCore>) -> Self {
        let (exit, wake) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("profile_io".into())
            .spawn(move || run(core, wake))
            .expect("failed to spawn profiler drain thread");
        Self { exit, thread }
    }

    /// Signal the worker and wait until it has drained and exited.
    pub fn stop(self) {
        let _ = self.exit.send(());
        let _ = self.thread.join();
    }
}

fn run(weak: Weak<ProfilerCore>, wake: Receiver<()>) {
    let mut sysinfo_counter = 0u32;
    let mut sysinfo: Option<Block> = None;

    loop {
        let wait = match weak.upgrade() {
            Some(core) => core.output_wait(),
            None => return,
        };
        match wake.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Some(core) = weak.upgrade() else { return };
        if !core.has_pending_roots() {
            continue;
        }

        let sink = core.current_sink();

        core.begin_block("profile_io");
        if core.has_pending_roots() {
            core.begin_block("process");
            // Only fully closed trees are ever published, so the chain we
            // detach cannot grow new children while we walk it.
            flatten::process_roots(&core, sink.as_deref());
            core.end_block();
        }

        sysinfo_counter += 1;
        if sysinfo_counter >= SYSINFO_INTERVAL {
            if let Some(sink) = &sink {
                let record = sysinfo.get_or_insert_with(|| sysinfo_record(&core));
                sink.write(&record.record_image());
            }
            sysinfo_counter = 0;
        }
        core.end_block();
    }

    // Final drain, then the stream terminator.
    if let Some(core) = weak.upgrade() {
        let sink = core.current_sink();
        if core.has_pending_roots() {
            flatten::process_roots(&core, sink.as_deref());
        }
        if let Some(sink) = sink {
            sink.write(&Block::zeroed().record_image());
        }
    }
}

fn sysinfo_record(core: &ProfilerCore) -> Block {
    let mut block = Block::zeroed();
    block.id = ids::SYSTEM_INFO;
    block.start = core.platform.ticks_per_second();
    block.set_name(b"sysinfo");
    block
}
