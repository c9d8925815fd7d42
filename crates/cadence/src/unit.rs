// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::time::Instant;

use crate::Pace;

/// A unit of periodic work driven by a [`Conductor`][crate::Conductor].
///
/// Implementors embed a [`Pace`] and expose it through
/// [`pace`][Self::pace]; the conductor sets the pace up before every
/// scheduled firing and then calls [`tick`][Self::tick] with the tick's
/// shared input and the shared output accumulator.
///
/// Units that track an explicit state embed an
/// [`Automaton`][crate::Automaton] instead and override
/// [`setup_turn`][Self::setup_turn] to forward to it; everything else keeps
/// the provided default.
///
/// # Contract
///
/// - `tick` runs once per scheduled firing, on the conductor's driving
///   thread, with the frozen time already recorded in the pace.
/// - Side effects are confined to the output accumulator and the unit's own
///   fields. References to the input or output must not be retained beyond
///   the call.
/// - Units registered together observe each other's output mutations within
///   the same tick, in registration order.
///
/// # Examples
///
/// ```
/// use cadence::{Clock, Pace, TimedUnit};
///
/// struct Counter {
///     pace: Pace,
/// }
///
/// impl TimedUnit<(), u32> for Counter {
///     fn pace(&mut self) -> &mut Pace {
///         &mut self.pace
///     }
///
///     fn tick(&mut self, _input: &(), output: &mut u32) {
///         *output += 1;
///     }
/// }
/// ```
pub trait TimedUnit<I, O>: Send {
    /// Access to the unit's embedded timing core.
    fn pace(&mut self) -> &mut Pace;

    /// Records the start of a scheduled firing.
    ///
    /// The conductor calls this with the tick's frozen time immediately
    /// before [`tick`][Self::tick]. The default forwards to the embedded
    /// [`Pace`]; units embedding an [`Automaton`][crate::Automaton] forward
    /// to [`Automaton::begin_turn`][crate::Automaton::begin_turn] instead so
    /// their state bookkeeping advances too.
    fn setup_turn(&mut self, frozen: Instant) {
        self.pace().begin_turn(frozen);
    }

    /// Performs one scheduled firing.
    fn tick(&mut self, input: &I, output: &mut O);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ClockControl;

    struct Sampler {
        pace: Pace,
        periods: Vec<Duration>,
    }

    impl TimedUnit<(), ()> for Sampler {
        fn pace(&mut self) -> &mut Pace {
            &mut self.pace
        }

        fn tick(&mut self, (): &(), (): &mut ()) {
            self.periods.push(self.pace.last_period());
        }
    }

    #[test]
    fn default_setup_turn_drives_the_pace() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let mut unit = Sampler {
            pace: Pace::new(&clock),
            periods: Vec::new(),
        };

        control.advance_millis(100);
        unit.setup_turn(clock.instant());
        unit.tick(&(), &mut ());

        control.advance_millis(300);
        unit.setup_turn(clock.instant());
        unit.tick(&(), &mut ());

        assert_eq!(
            unit.periods,
            vec![Duration::from_millis(100), Duration::from_millis(300)]
        );
    }
}
