// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

//! Cooperative multi-rate periodic execution.
//!
//! This crate runs a roster of control-style units at divided multiples of
//! one base rate. A [`Conductor`] owns shared input and output values and a
//! background driver that fires a tick every base period; each tick freezes
//! a single timestamp, snapshots the input, runs the units that are due in
//! registration order, and publishes the accumulated output.
//!
//! The building blocks:
//!
//! - [`Conductor`] drives the roster, guards the shared input and output,
//!   and nests pause and unpause.
//! - [`TimedUnit`] is the trait a unit implements to be driven.
//! - [`Pace`] is the per-unit timing core: the frozen tick time and the
//!   delta since the unit's own previous firing.
//! - [`Automaton`] layers explicit state, time-in-state, and transition
//!   recency on top of a pace.
//! - [`Stopwatch`] measures elapsed tick time and detaches safely when its
//!   unit goes away.
//! - [`Clock`] is the time source; in tests, [`ClockControl`] freezes and
//!   advances it by hand.
//!
//! # Quick start
//!
//! ```
//! use std::time::Duration;
//!
//! use cadence::{Clock, Conductor, Pace, TimedUnit};
//!
//! struct Heartbeat {
//!     pace: Pace,
//! }
//!
//! impl TimedUnit<(), u64> for Heartbeat {
//!     fn pace(&mut self) -> &mut Pace {
//!         &mut self.pace
//!     }
//!
//!     fn tick(&mut self, _input: &(), beats: &mut u64) {
//!         *beats += 1;
//!     }
//! }
//!
//! # fn main() -> cadence::Result<()> {
//! let clock = Clock::new();
//! let conductor = Conductor::new(&clock, (), 0_u64, Duration::from_millis(100));
//!
//! let unit = Heartbeat {
//!     pace: Pace::new(&clock),
//! };
//! conductor.add_unit(Duration::from_millis(200), Box::new(unit))?;
//!
//! // Paused conductors are driven by hand; unpause() starts the real
//! // driver.
//! conductor.step()?;
//! assert_eq!(*conductor.output(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! With the `test-util` feature, [`ClockControl`] provides a manually
//! advanced time source, and [`Conductor::step`] runs ticks without any
//! background thread, so scheduling and timer behavior can be asserted
//! deterministically.

mod automaton;
mod clock;
#[cfg(any(feature = "test-util", test))]
mod clock_control;
mod conductor;
mod error;
mod guards;
mod pace;
mod stopwatch;
mod unit;

pub use automaton::Automaton;
pub use clock::Clock;
#[cfg(any(feature = "test-util", test))]
pub use clock_control::ClockControl;
pub use conductor::{Conductor, UnitKey};
#[cfg(test)]
pub(crate) use error::ErrorKind;
pub use error::{Error, Result};
pub use guards::{InputGuard, OutputGuard};
pub use pace::Pace;
pub use stopwatch::Stopwatch;
pub use unit::TimedUnit;
