//! RAII scope guards.

use crate::api::profiler::Profiler;

/// Ends a profiled block when dropped.
///
/// Created by [`Profiler::scope`]. If the block could not be opened
/// (profiler disabled, pool exhausted), dropping the guard does nothing, so
/// an enclosing scope is never closed by accident.
///
/// # Example
///
/// ```rust,no_run
/// use blockprof::{ProfileConfig, Profiler};
///
/// let profiler = Profiler::new(ProfileConfig::default());
/// profiler.enable(true);
///
/// {
///     let _scope = profiler.scope("physics");
///     // ... work ...
/// } // block ends here
/// ```
pub struct ScopeGuard<'a> {
    profiler: &'a Profiler,
    opened: bool,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn new(profiler: &'a Profiler, name: &str) -> Self {
        let opened = profiler.core().begin_block(name);
        Self { profiler, opened }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if self.opened {
            self.profiler.end_block();
        }
    }
}

/// Profile the rest of the current lexical scope.
///
/// Expands to a [`ScopeGuard`] bound to a hidden local.
///
/// ```rust,no_run
/// use blockprof::{profile_scope, ProfileConfig, Profiler};
///
/// fn update(profiler: &Profiler) {
///     profile_scope!(profiler, "update");
///     // ... work ...
/// }
/// ```
#[macro_export]
macro_rules! profile_scope {
    ($profiler:expr, $name:expr) => {
        let _profile_scope_guard = $profiler.scope($name);
    };
}
