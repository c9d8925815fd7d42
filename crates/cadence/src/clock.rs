// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::time::Instant;

/// Provides the engine's view of monotonic time.
///
/// Scheduling logic never calls [`Instant::now`] directly; it reads time
/// through a clock handle. In production the clock forwards to the system's
/// monotonic source with no overhead worth mentioning. In tests, a clock
/// created from a [`ClockControl`][crate::ClockControl] stands still until
/// the test advances it, which makes every timing property of the engine
/// checkable without sleeping.
///
/// Cloning a clock is inexpensive and every clone observes the same time
/// source, including controlled time when the `test-util` feature is
/// enabled.
///
/// # Examples
///
/// ```
/// use cadence::Clock;
///
/// let clock = Clock::new();
///
/// let earlier = clock.instant();
/// let later = clock.instant();
///
/// assert!(later >= earlier);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Clock(ClockRepr);

#[derive(Debug, Clone, Default)]
enum ClockRepr {
    #[default]
    System,
    #[cfg(any(feature = "test-util", test))]
    Control(crate::ClockControl),
}

impl Clock {
    /// Creates a clock backed by the system's monotonic time source.
    #[must_use]
    pub fn new() -> Self {
        Self(ClockRepr::System)
    }

    /// Creates a clock whose time never advances on its own.
    ///
    /// This is a convenience method equivalent to
    /// `ClockControl::new().to_clock()`. Keep a [`ClockControl`][crate::ClockControl]
    /// around instead when the test needs to advance time.
    #[cfg(any(feature = "test-util", test))]
    #[must_use]
    pub fn new_frozen() -> Self {
        crate::ClockControl::new().to_clock()
    }

    #[cfg(any(feature = "test-util", test))]
    pub(crate) fn with_control(control: &crate::ClockControl) -> Self {
        Self(ClockRepr::Control(control.clone()))
    }

    /// Retrieves the current monotonic time.
    ///
    /// For a system-backed clock this is [`Instant::now`]. For a
    /// control-backed clock it is whatever instant the controlling test has
    /// advanced to.
    #[must_use]
    pub fn instant(&self) -> Instant {
        match &self.0 {
            ClockRepr::System => Instant::now(),
            #[cfg(any(feature = "test-util", test))]
            ClockRepr::Control(control) => control.instant(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ClockControl;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Clock: Send, Sync, Clone, std::fmt::Debug);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = Clock::new();

        let earlier = clock.instant();
        let later = clock.instant();

        assert!(later >= earlier);
    }

    #[test]
    fn frozen_clock_stands_still() {
        let clock = Clock::new_frozen();

        let earlier = clock.instant();
        std::thread::sleep(Duration::from_micros(10));

        assert_eq!(clock.instant(), earlier);
    }

    #[test]
    fn control_backed_clock_follows_control() {
        let control = ClockControl::new();
        let clock = control.to_clock();

        let start = clock.instant();
        control.advance(Duration::from_secs(3));

        assert_eq!(clock.instant() - start, Duration::from_secs(3));
    }

    #[test]
    fn clones_share_the_time_source() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let clone = clock.clone();

        control.advance_millis(250);

        assert_eq!(clock.instant(), clone.instant());
    }
}
