// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::time::{Duration, Instant};

use crate::{Clock, Pace, Stopwatch};

/// State bookkeeping for units that behave like finite-state programs.
///
/// An `Automaton<S>` wraps a [`Pace`] and adds an explicit current state,
/// the time accumulated in that state, and a short memory of when the last
/// transition happened. Units embed it instead of a bare pace, forward
/// [`TimedUnit::setup_turn`][crate::TimedUnit::setup_turn] to
/// [`begin_turn`][Self::begin_turn], and write their `tick` body as a match
/// over [`state`][Self::state].
///
/// There are no on-enter or on-exit hooks, deliberately: all transition
/// logic lives in the ordinary `tick` body, guarded by state inspection.
/// [`after_state_change`][Self::after_state_change] covers the common "first
/// tick in a new state" pattern without hooks.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
///
/// use cadence::{Automaton, Clock, Pace, TimedUnit};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Phase {
///     Filling,
///     Settling,
/// }
///
/// struct Valve {
///     auto: Automaton<Phase>,
/// }
///
/// impl TimedUnit<f32, f32> for Valve {
///     fn pace(&mut self) -> &mut Pace {
///         self.auto.pace_mut()
///     }
///
///     fn setup_turn(&mut self, frozen: Instant) {
///         self.auto.begin_turn(frozen);
///     }
///
///     fn tick(&mut self, level: &f32, command: &mut f32) {
///         match self.auto.state() {
///             Phase::Filling => {
///                 *command = 1.0;
///                 if *level >= 0.9 {
///                     self.auto.set_state(Phase::Settling);
///                 }
///             }
///             Phase::Settling => {
///                 *command = 0.0;
///                 if self.auto.time_in_state() > Duration::from_secs(5) {
///                     self.auto.set_state(Phase::Filling);
///                 }
///             }
///         }
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Automaton<S> {
    pace: Pace,
    state: S,
    state_timer: Duration,
    recency: Recency,
}

/// How long ago the last transition happened, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recency {
    JustChanged,
    ChangedPreviousTurn,
    Stable,
}

impl Recency {
    fn decayed(self) -> Self {
        match self {
            Self::JustChanged => Self::ChangedPreviousTurn,
            Self::ChangedPreviousTurn | Self::Stable => Self::Stable,
        }
    }
}

impl<S> Automaton<S> {
    /// Creates an automaton in the given initial state.
    ///
    /// Entering the initial state counts as a transition: the unit's first
    /// firing observes [`after_state_change`][Self::after_state_change] as
    /// `true`.
    #[must_use]
    pub fn new(clock: &Clock, initial: S) -> Self {
        Self {
            pace: Pace::new(clock),
            state: initial,
            state_timer: Duration::ZERO,
            recency: Recency::JustChanged,
        }
    }

    /// Records the start of a scheduled firing.
    ///
    /// Runs the embedded pace's turn setup, accumulates the time spent in
    /// the current state, and ages the transition memory by one tick.
    pub fn begin_turn(&mut self, frozen: Instant) {
        self.pace.begin_turn(frozen);
        self.state_timer += self.pace.last_period();
        self.recency = self.recency.decayed();
    }

    /// Returns the time since the last change of state.
    #[must_use]
    pub fn time_in_state(&self) -> Duration {
        self.state_timer
    }

    /// Returns true exactly on the first firing after a state change.
    ///
    /// False on the firing in which the transition itself happened, and
    /// false again from the second firing after the change onwards.
    #[must_use]
    pub fn after_state_change(&self) -> bool {
        self.recency == Recency::ChangedPreviousTurn
    }

    /// Access to the embedded timing core.
    #[must_use]
    pub fn pace(&self) -> &Pace {
        &self.pace
    }

    /// Mutable access to the embedded timing core.
    #[must_use]
    pub fn pace_mut(&mut self) -> &mut Pace {
        &mut self.pace
    }

    /// Mints a [`Stopwatch`] from the embedded pace.
    #[must_use]
    pub fn stopwatch(&self) -> Stopwatch {
        self.pace.stopwatch()
    }
}

impl<S: Copy + PartialEq> Automaton<S> {
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> S {
        self.state
    }

    /// Transitions to a new state.
    ///
    /// Assigning the current state again is a no-op: no timer reset, no
    /// transition recorded. On an actual change the time-in-state resets to
    /// zero immediately and the next firing reports
    /// [`after_state_change`][Self::after_state_change].
    pub fn set_state(&mut self, next: S) {
        if self.state == next {
            return;
        }
        self.state = next;
        self.state_timer = Duration::ZERO;
        self.recency = Recency::JustChanged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClockControl;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Gate {
        Closed,
        Opening,
        Open,
    }

    fn advance_turn(control: &ClockControl, clock: &Clock, auto: &mut Automaton<Gate>, millis: u64) {
        control.advance_millis(millis);
        auto.begin_turn(clock.instant());
    }

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Automaton<u8>: Send, Sync, std::fmt::Debug);
    }

    #[test]
    fn time_in_state_accumulates_per_turn() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut auto = Automaton::new(&clock, Gate::Closed);

        advance_turn(&control, &clock, &mut auto, 100);
        advance_turn(&control, &clock, &mut auto, 100);

        assert_eq!(auto.time_in_state(), Duration::from_millis(200));
    }

    #[test]
    fn reassigning_the_same_state_is_inert() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut auto = Automaton::new(&clock, Gate::Closed);

        advance_turn(&control, &clock, &mut auto, 100);
        auto.set_state(Gate::Closed);

        // No reset and no transition event.
        assert_eq!(auto.time_in_state(), Duration::from_millis(100));
        advance_turn(&control, &clock, &mut auto, 100);
        assert_eq!(auto.time_in_state(), Duration::from_millis(200));
        assert!(!auto.after_state_change());
    }

    #[test]
    fn transition_resets_time_in_state() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut auto = Automaton::new(&clock, Gate::Closed);

        advance_turn(&control, &clock, &mut auto, 300);
        auto.set_state(Gate::Opening);
        assert_eq!(auto.time_in_state(), Duration::ZERO);

        advance_turn(&control, &clock, &mut auto, 100);
        assert_eq!(auto.time_in_state(), Duration::from_millis(100));
        assert_eq!(auto.state(), Gate::Opening);
    }

    #[test]
    fn after_state_change_is_true_exactly_one_turn_later() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut auto = Automaton::new(&clock, Gate::Closed);

        // Settle past the initial-state transition.
        advance_turn(&control, &clock, &mut auto, 100);
        advance_turn(&control, &clock, &mut auto, 100);
        assert!(!auto.after_state_change());

        auto.set_state(Gate::Opening);
        // Transition turn itself: not reported.
        assert!(!auto.after_state_change());

        // First turn after the transition: reported.
        advance_turn(&control, &clock, &mut auto, 100);
        assert!(auto.after_state_change());

        // Second turn after: no longer reported.
        advance_turn(&control, &clock, &mut auto, 100);
        assert!(!auto.after_state_change());
    }

    #[test]
    fn initial_state_counts_as_a_transition() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut auto = Automaton::new(&clock, Gate::Open);

        advance_turn(&control, &clock, &mut auto, 100);

        assert!(auto.after_state_change());
    }

    #[test]
    fn stopwatch_minted_from_the_automaton_pace() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut auto = Automaton::new(&clock, Gate::Closed);

        let watch = auto.stopwatch();
        advance_turn(&control, &clock, &mut auto, 1_000);

        assert_eq!(watch.elapsed(), Duration::from_secs(1));
    }
}
