// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::Clock;

/// Controls the flow of time in tests.
///
/// A clock created with [`ClockControl::to_clock`] stands still until the
/// control advances it. Handing such a clock to a
/// [`Conductor`][crate::Conductor] and driving ticks with
/// [`Conductor::step`][crate::Conductor::step] makes every timing property
/// of the engine deterministic: no sleeping, no tolerance windows.
///
/// `ClockControl` is available when the `test-util` feature is enabled.
/// Never enable that feature outside of `dev-dependencies`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cadence::ClockControl;
///
/// let control = ClockControl::new();
/// let clock = control.to_clock();
///
/// let start = clock.instant();
/// control.advance(Duration::from_secs(1));
///
/// assert_eq!(clock.instant() - start, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClockControl {
    // Time control must be consistent across every thread holding a clone
    // of the derived clock, hence the shared mutex.
    instant: Arc<Mutex<Option<Instant>>>,
}

impl ClockControl {
    /// Creates a control whose clock starts at the current instant and does
    /// not advance on its own.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instant: Arc::new(Mutex::new(None)),
        }
    }

    /// Converts the control to a [`Clock`] instance.
    #[must_use]
    pub fn to_clock(&self) -> Clock {
        Clock::with_control(self)
    }

    /// Manually advances the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let mut instant = self.instant.lock();
        let now = instant.unwrap_or_else(Instant::now);
        *instant = Some(now + duration);
    }

    /// Manually advances the clock by the specified number of milliseconds.
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    pub(crate) fn instant(&self) -> Instant {
        // The anchor is captured lazily on first read so that a control
        // constructed early in a test does not skew relative measurements.
        let mut instant = self.instant.lock();
        *instant.get_or_insert_with(Instant::now)
    }
}

impl From<ClockControl> for Clock {
    fn from(control: ClockControl) -> Self {
        control.to_clock()
    }
}

impl From<&ClockControl> for Clock {
    fn from(control: &ClockControl) -> Self {
        control.to_clock()
    }
}
