// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::sync::Weak;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Measures elapsed tick time from the moment it was minted.
///
/// A stopwatch is created with [`Pace::stopwatch`][crate::Pace::stopwatch]
/// and reads time against its owning unit's frozen tick time, so every read
/// within one tick reports the same value. It holds only a weak handle to
/// the unit's timing state: it never extends the unit's lifetime, and once
/// the unit is dropped or removed from the conductor it reports zero rather
/// than dangling.
///
/// A default-constructed stopwatch is detached and always reports zero.
/// This makes `Stopwatch` a convenient field type: start with the default,
/// assign a real one when a state begins, and
/// [`deactivate`][Self::deactivate] it when done.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cadence::Stopwatch;
///
/// let idle = Stopwatch::default();
///
/// assert_eq!(idle.elapsed(), Duration::ZERO);
/// assert!(!idle.is_active());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    binding: Option<Binding>,
}

#[derive(Debug, Clone)]
struct Binding {
    started: Instant,
    frozen: Weak<Mutex<Instant>>,
}

impl Stopwatch {
    pub(crate) fn bound(started: Instant, frozen: Weak<Mutex<Instant>>) -> Self {
        Self {
            binding: Some(Binding { started, frozen }),
        }
    }

    /// Returns the time since this stopwatch was minted, as seen by the
    /// owning unit's frozen tick time.
    ///
    /// Detached stopwatches, and stopwatches whose unit no longer exists,
    /// report [`Duration::ZERO`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        match &self.binding {
            Some(binding) => binding
                .frozen
                .upgrade()
                .map_or(Duration::ZERO, |cell| cell.lock().saturating_duration_since(binding.started)),
            None => Duration::ZERO,
        }
    }

    /// Returns whether the stopwatch is bound to a live unit.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|binding| binding.frozen.strong_count() > 0)
    }

    /// Detaches the stopwatch so it reports zero from now on.
    pub fn deactivate(&mut self) {
        self.binding = None;
    }
}
