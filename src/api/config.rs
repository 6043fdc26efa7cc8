//! Profiler configuration.

use std::time::Duration;

use crate::api::record::RECORD_SIZE;
use crate::util::size::{kb, mb};

/// Configuration for [`Profiler::new`](crate::Profiler::new).
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Stream identifier recorded for the session (metadata only).
    pub identifier: String,

    /// Pool size in bytes. One block is 64 bytes and one slot is reserved
    /// as the null sentinel, so `memory / 64` slots (capped at 65535) back
    /// the profiler and one fewer is usable.
    pub memory: usize,

    /// Period between drain wakes (clamped to at least 1 ms).
    pub output_wait: Duration,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            identifier: "profile".to_string(),
            memory: mb(1), // 16384 blocks
            output_wait: Duration::from_millis(100),
        }
    }
}

impl ProfileConfig {
    /// Minimal footprint for tests or constrained targets.
    pub fn minimal() -> Self {
        Self {
            identifier: "profile".to_string(),
            memory: kb(16), // 256 blocks
            output_wait: Duration::from_millis(10),
        }
    }

    /// Builder pattern: set the stream identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Builder pattern: set the pool size in bytes.
    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory;
        self
    }

    /// Builder pattern: set the pool size in whole blocks (including the
    /// reserved sentinel slot).
    pub fn with_blocks(mut self, blocks: usize) -> Self {
        self.memory = blocks * RECORD_SIZE;
        self
    }

    /// Builder pattern: set the drain period.
    pub fn with_output_wait(mut self, wait: Duration) -> Self {
        self.output_wait = wait;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let config = ProfileConfig::default()
            .with_identifier("game")
            .with_blocks(1024)
            .with_output_wait(Duration::from_millis(5));
        assert_eq!(config.identifier, "game");
        assert_eq!(config.memory, 1024 * RECORD_SIZE);
        assert_eq!(config.output_wait, Duration::from_millis(5));
    }
}
