// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::{Clock, Stopwatch};

/// The per-unit timing core every tickable unit embeds.
///
/// The conductor freezes one timestamp per global tick and hands it to each
/// unit that fires, through [`begin_turn`][Self::begin_turn]. The pace keeps
/// that frozen time plus the delta since the unit's own previous firing, so
/// a unit's control logic always works against a stable clock for the whole
/// tick.
///
/// A unit that fires on a divided rate is simply set up less often; the
/// recorded delta then spans the skipped ticks, which is exactly the wall
/// time its control law should integrate over.
///
/// # Examples
///
/// ```
/// use cadence::{Clock, Pace};
///
/// struct Blinker {
///     pace: Pace,
///     lit: bool,
/// }
///
/// let clock = Clock::new();
/// let blinker = Blinker {
///     pace: Pace::new(&clock),
///     lit: false,
/// };
/// ```
#[derive(Debug)]
pub struct Pace {
    // Shared with stopwatches minted from this pace; they hold a weak
    // handle, so a stopwatch never keeps its unit alive.
    frozen: Arc<Mutex<Instant>>,
    time_increase: Duration,
}

impl Pace {
    /// Creates a pace anchored at the clock's current instant.
    ///
    /// Until the first turn, [`frame_time`][Self::frame_time] reports the
    /// creation instant and [`last_period`][Self::last_period] is zero.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            frozen: Arc::new(Mutex::new(clock.instant())),
            time_increase: Duration::ZERO,
        }
    }

    /// Records the start of a scheduled firing.
    ///
    /// Called by the conductor with the tick's frozen time before the unit's
    /// `tick` runs. The recorded delta is measured from this pace's own
    /// previous turn, not from the previous global tick.
    pub(crate) fn begin_turn(&mut self, frozen: Instant) {
        let mut cell = self.frozen.lock();
        self.time_increase = frozen.saturating_duration_since(*cell);
        *cell = frozen;
    }

    /// Returns the time between the current turn and the previous one.
    #[must_use]
    pub fn last_period(&self) -> Duration {
        self.time_increase
    }

    /// Returns the frozen time, constant for the whole tick.
    #[must_use]
    pub fn frame_time(&self) -> Instant {
        *self.frozen.lock()
    }

    /// Mints a [`Stopwatch`] measuring from the current frozen time.
    ///
    /// The stopwatch reads this pace's frozen time through a weak handle;
    /// it reports zero once the pace (and so the unit) is gone.
    #[must_use]
    pub fn stopwatch(&self) -> Stopwatch {
        Stopwatch::bound(self.frame_time(), Arc::downgrade(&self.frozen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClockControl;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Pace: Send, Sync, std::fmt::Debug);
    }

    #[test]
    fn new_pace_reports_zero_period() {
        let clock = Clock::new_frozen();
        let pace = Pace::new(&clock);

        assert_eq!(pace.last_period(), Duration::ZERO);
        assert_eq!(pace.frame_time(), clock.instant());
    }

    #[test]
    fn begin_turn_measures_since_previous_turn() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut pace = Pace::new(&clock);

        control.advance_millis(100);
        pace.begin_turn(clock.instant());
        assert_eq!(pace.last_period(), Duration::from_millis(100));

        control.advance_millis(40);
        pace.begin_turn(clock.instant());
        assert_eq!(pace.last_period(), Duration::from_millis(40));
    }

    #[test]
    fn skipped_turns_fold_into_one_delta() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut pace = Pace::new(&clock);

        // Three base periods pass, but the unit is only set up once.
        control.advance_millis(300);
        pace.begin_turn(clock.instant());

        assert_eq!(pace.last_period(), Duration::from_millis(300));
    }

    #[test]
    fn frame_time_tracks_the_latest_turn() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut pace = Pace::new(&clock);

        control.advance_millis(10);
        let frozen = clock.instant();
        pace.begin_turn(frozen);

        assert_eq!(pace.frame_time(), frozen);
    }
}
