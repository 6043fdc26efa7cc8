//! Diagnostic emission backend.
//!
//! Handles outputting diagnostics to stderr, logs, or a custom sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::sync::Mutex;

use super::kind::{Diagnostic, DiagnosticKind};

/// Global flag to suppress diagnostic output (for testing).
static DIAGNOSTICS_SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Installed diagnostic sink, if any.
static DIAGNOSTIC_SINK: Mutex<Option<Arc<dyn DiagnosticSink>>> = Mutex::new(None);

/// Suppress all diagnostic output.
pub fn suppress_diagnostics(suppress: bool) {
    DIAGNOSTICS_SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    DIAGNOSTICS_SUPPRESSED.load(Ordering::Relaxed)
}

/// Install a sink receiving every emitted diagnostic, or `None` to remove it.
///
/// The sink is invoked regardless of suppression and build profile, which
/// makes it the reliable way to observe diagnostics in tests.
pub fn set_diagnostic_sink(sink: Option<Arc<dyn DiagnosticSink>>) {
    *DIAGNOSTIC_SINK.lock() = sink;
}

/// Emit a diagnostic.
///
/// Reaches stderr in debug builds and in release builds with the
/// `diagnostics` feature; reaches the `log` crate with the `log` feature.
pub fn emit(diag: &Diagnostic) {
    emit_inner(diag, None);
}

/// Emit a diagnostic with additional runtime context.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    emit_inner(diag, Some(context));
}

fn emit_inner(diag: &Diagnostic, context: Option<&str>) {
    if let Some(sink) = DIAGNOSTIC_SINK.lock().clone() {
        sink.emit(diag, context);
    }

    if is_suppressed() {
        return;
    }

    #[cfg(any(debug_assertions, feature = "diagnostics"))]
    emit_to_stderr(diag, context);

    #[cfg(feature = "log")]
    emit_to_log(diag, context);
}

#[cfg(any(debug_assertions, feature = "diagnostics"))]
fn emit_to_stderr(diag: &Diagnostic, context: Option<&str>) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(
        stderr,
        "[blockprof][{}] {}: {}",
        diag.code,
        diag.kind.prefix(),
        diag.message
    );
    if let Some(context) = context {
        let _ = writeln!(stderr, "  context: {}", context);
    }
    if let Some(help) = diag.help {
        let _ = writeln!(stderr, "  help: {}", help);
    }
}

/// Emit a diagnostic through the log crate.
#[cfg(feature = "log")]
fn emit_to_log(diag: &Diagnostic, context: Option<&str>) {
    let context = context.unwrap_or("");
    match diag.kind {
        DiagnosticKind::Error => log::error!("[{}] {} {}", diag.code, diag.message, context),
        DiagnosticKind::Warning => log::warn!("[{}] {} {}", diag.code, diag.message, context),
    }
}

/// A diagnostic sink for custom output.
pub trait DiagnosticSink: Send + Sync {
    /// Handle a diagnostic.
    fn emit(&self, diag: &Diagnostic, context: Option<&str>);
}

/// A simple sink that collects diagnostics.
pub struct CollectingDiagnostics {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    /// Create a new collecting sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Get the codes of all collected diagnostics.
    pub fn codes(&self) -> Vec<&'static str> {
        self.diagnostics.lock().iter().map(|d| d.code).collect()
    }

    /// Clear collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }

    /// Check if any errors were collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }
}

impl Default for CollectingDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn emit(&self, diag: &Diagnostic, _context: Option<&str>) {
        self.diagnostics.lock().push(diag.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::kind::BP201;

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingDiagnostics::new();
        sink.emit(&BP201, None);

        assert_eq!(sink.diagnostics().len(), 1);
        assert!(sink.has_errors());

        sink.clear();
        assert_eq!(sink.diagnostics().len(), 0);
    }

    #[test]
    fn test_suppression() {
        suppress_diagnostics(true);
        assert!(is_suppressed());
        suppress_diagnostics(false);
        assert!(!is_suppressed());
    }
}
