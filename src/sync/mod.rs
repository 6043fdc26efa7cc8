//! Synchronization primitives for the cold paths.
//!
//! Producer paths are lock-free; the mutex below only guards the installed
//! record sink, the drain worker handle, and the diagnostics sink. Uses
//! parking_lot when the feature is enabled, std otherwise.

#[cfg(feature = "parking_lot")]
pub(crate) use parking_lot::Mutex;

#[cfg(not(feature = "parking_lot"))]
mod fallback {
    use std::sync::{Mutex as StdMutex, MutexGuard};

    /// Thin wrapper giving std's mutex parking_lot's panic-free `lock`.
    pub struct Mutex<T>(StdMutex<T>);

    impl<T> Mutex<T> {
        /// Create a new mutex.
        pub const fn new(value: T) -> Self {
            Self(StdMutex::new(value))
        }

        /// Lock the mutex, recovering from poisoning.
        pub fn lock(&self) -> MutexGuard<'_, T> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }
    }
}

#[cfg(not(feature = "parking_lot"))]
pub(crate) use fallback::Mutex;
