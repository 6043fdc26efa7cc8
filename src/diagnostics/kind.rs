//! Diagnostic kinds and predefined diagnostics.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - internal state is inconsistent.
    Error,
    /// A warning - events are being lost or behavior is degraded.
    Warning,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
        }
    }
}

/// A diagnostic message with a stable code.
///
/// Diagnostic codes follow the pattern:
/// - `BP0xx` - Block pool issues
/// - `BP1xx` - Threading issues
/// - `BP2xx` - Lifecycle / accounting issues
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "BP001").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            help: None,
        }
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (BP0xx - Block pool)
// =============================================================================

/// BP001: block pool exhausted, pool smaller than the slot-index limit.
pub const BP001: Diagnostic = Diagnostic::warning(
    "BP001",
    "profile block pool exhausted, events are being dropped",
)
.with_help("increase ProfileConfig::memory to back more blocks");

/// BP002: block pool exhausted at the maximum slot count.
pub const BP002: Diagnostic = Diagnostic::warning(
    "BP002",
    "profile block pool exhausted, events are being dropped",
)
.with_help("decrease the output wait so the drain reclaims blocks sooner");

// =============================================================================
// Predefined diagnostics (BP1xx - Threading)
// =============================================================================

/// BP101: thread cleanup found a self-referencing open block.
pub const BP101: Diagnostic = Diagnostic::error(
    "BP101",
    "open block chain is self-referencing, abandoning thread cleanup",
);

// =============================================================================
// Predefined diagnostics (BP2xx - Lifecycle)
// =============================================================================

/// BP201: pool accounting mismatch at finalize.
pub const BP201: Diagnostic = Diagnostic::error(
    "BP201",
    "block accounting mismatch at finalize, blocks were lost",
)
.with_help("a panicking record sink can strand in-flight blocks");

/// BP202: root chain not empty at finalize.
pub const BP202: Diagnostic = Diagnostic::error(
    "BP202",
    "root chain not empty at finalize, at least one tree was never drained",
);

/// BP203: a free block still carries a sibling link at finalize.
pub const BP203: Diagnostic = Diagnostic::error(
    "BP203",
    "free block still carries a sibling link",
);
