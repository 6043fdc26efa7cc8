//! Profiler statistics.

/// Snapshot of profiler counters.
#[derive(Debug, Clone, Default)]
pub struct ProfileStats {
    /// Total pool slots, including the reserved null slot.
    pub capacity: usize,

    /// Events dropped because the pool was exhausted.
    pub dropped_events: u64,

    /// Whether instrumentation is currently enabled.
    pub enabled: bool,
}

impl ProfileStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Usable slots: capacity minus the reserved sentinel.
    pub fn usable_blocks(&self) -> usize {
        self.capacity.saturating_sub(1)
    }
}

impl std::fmt::Display for ProfileStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Profiler Statistics:")?;
        writeln!(f, "  Pool capacity:  {} blocks", self.capacity)?;
        writeln!(f, "  Usable blocks:  {}", self.usable_blocks())?;
        writeln!(f, "  Dropped events: {}", self.dropped_events)?;
        writeln!(f, "  Enabled:        {}", self.enabled)?;
        Ok(())
    }
}
