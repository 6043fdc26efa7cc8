//! Diagnostics: profiler-side warnings with stable codes.
//!
//! The profiler never propagates errors to producers; conditions worth
//! reporting (pool exhaustion, accounting mismatches at finalize) surface
//! here instead.
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                          |
//! |-------|----------------------------------|
//! | BP0xx | Block pool issues                |
//! | BP1xx | Threading issues                 |
//! | BP2xx | Lifecycle / accounting issues    |

pub mod emit;
pub mod kind;

// Re-export core types
pub use emit::{
    emit, emit_with_context, set_diagnostic_sink, suppress_diagnostics, CollectingDiagnostics,
    DiagnosticSink,
};
pub use kind::{Diagnostic, DiagnosticKind};

// Re-export predefined diagnostics
pub use kind::{BP001, BP002, BP101, BP201, BP202, BP203};
