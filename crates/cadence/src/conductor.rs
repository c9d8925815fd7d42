// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use metronome::Metronome;
use parking_lot::Mutex;

use crate::{Clock, Error, InputGuard, OutputGuard, Result, TimedUnit};

/// Identifies a unit registered with a [`Conductor`].
///
/// Returned by [`Conductor::add_unit`] and consumed by
/// [`Conductor::remove_unit`]. Keys are never reused within one conductor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitKey(u32);

/// Drives a roster of [`TimedUnit`]s at divided multiples of one base rate.
///
/// A conductor owns a shared input value, a shared output value, and a list
/// of units, each registered with a period that is an exact multiple of the
/// conductor's base period. Once unpaused, a background driver fires a tick
/// every base period; each tick freezes a single timestamp, snapshots the
/// input, runs every unit whose divided rate is due, and publishes the
/// accumulated output.
///
/// Within one tick, units run on one thread in registration order against
/// the same frozen time, and each sees the output mutations of the units
/// that ran before it. The input snapshot and the output write-back each
/// hold their mutex only briefly, and no conductor operation ever holds the
/// input and output mutexes at once. Holding an [`input`][Self::input] or
/// [`output`][Self::output] guard delays the tick's exchange step, but every
/// other operation on the conductor stays available.
///
/// A conductor starts paused. [`pause`][Self::pause] and
/// [`unpause`][Self::unpause] nest: ticking resumes only once every pause
/// has been matched by an unpause. While paused, [`step`][Self::step] runs
/// a single tick by hand, which is the deterministic way to drive a
/// conductor in tests.
///
/// Cloning a conductor is cheap and yields another handle to the same
/// engine.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cadence::{Clock, Conductor, Pace, TimedUnit};
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
///     fn tick(&mut self, _input: &(), total: &mut u32) {
///         *total += 1;
///     }
/// }
///
/// # fn main() -> cadence::Result<()> {
/// let clock = Clock::new();
/// let conductor = Conductor::new(&clock, (), 0_u32, Duration::from_millis(100));
///
/// let counter = Counter {
///     pace: Pace::new(&clock),
/// };
/// conductor.add_unit(Duration::from_millis(100), Box::new(counter))?;
///
/// conductor.step()?;
/// conductor.step()?;
/// assert_eq!(*conductor.output(), 2);
/// # Ok(())
/// # }
/// ```
pub struct Conductor<I, O> {
    core: Arc<Core<I, O>>,
}

type InputTrigger<I> = Box<dyn FnMut(&mut I) + Send>;
type OutputTrigger<O> = Box<dyn FnMut(&O) + Send>;

struct Core<I, O> {
    clock: Clock,
    base_period: Duration,
    // Ticks are serialized by the single driver (or by the paused-only
    // `step` contract); the atomic keeps `turns` readable mid-tick.
    turn: AtomicU64,
    input: Mutex<I>,
    output: Mutex<O>,
    roster: Mutex<Roster<I, O>>,
    input_trigger: Mutex<Option<InputTrigger<I>>>,
    output_trigger: Mutex<Option<OutputTrigger<O>>>,
    pause: Mutex<PauseState>,
}

struct Roster<I, O> {
    units: Vec<Entry<I, O>>,
    next_key: u32,
}

struct Entry<I, O> {
    key: UnitKey,
    divisor: u64,
    unit: Box<dyn TimedUnit<I, O>>,
}

struct PauseState {
    depth: u32,
    driver: Option<Metronome>,
}

impl<I, O> Conductor<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    /// Creates a paused conductor over the given shared input and output.
    ///
    /// The base period is the interval of the driving tick; every unit
    /// period must be an exact multiple of it.
    ///
    /// # Panics
    ///
    /// Panics if `base_period` is zero.
    #[must_use]
    pub fn new(clock: &Clock, input: I, output: O, base_period: Duration) -> Self {
        assert!(!base_period.is_zero(), "base period must be non-zero");

        Self {
            core: Arc::new(Core {
                clock: clock.clone(),
                base_period,
                turn: AtomicU64::new(0),
                input: Mutex::new(input),
                output: Mutex::new(output),
                roster: Mutex::new(Roster {
                    units: Vec::new(),
                    next_key: 0,
                }),
                input_trigger: Mutex::new(None),
                output_trigger: Mutex::new(None),
                pause: Mutex::new(PauseState {
                    depth: 1,
                    driver: None,
                }),
            }),
        }
    }

    /// Returns the base tick period.
    #[must_use]
    pub fn base_period(&self) -> Duration {
        self.core.base_period
    }

    /// Registers a unit to fire every `period`, appended after all units
    /// registered so far.
    ///
    /// # Errors
    ///
    /// Fails if the conductor is not paused, or if `period` is not a
    /// positive multiple of the base period.
    pub fn add_unit(&self, period: Duration, unit: Box<dyn TimedUnit<I, O>>) -> Result<UnitKey> {
        self.ensure_paused()?;

        let base = self.core.base_period;
        if period.is_zero() || period.as_nanos() % base.as_nanos() != 0 {
            return Err(Error::period_mismatch(period, base));
        }
        let divisor = u64::try_from(period.as_nanos() / base.as_nanos())
            .map_err(|_| Error::period_mismatch(period, base))?;

        let mut roster = self.core.roster.lock();
        let key = UnitKey(roster.next_key);
        roster.next_key += 1;
        roster.units.push(Entry { key, divisor, unit });

        tracing::event!(
            name: "conductor.unit_added",
            tracing::Level::DEBUG,
            key = key.0,
            divisor,
        );
        Ok(key)
    }

    /// Removes a previously registered unit, dropping it immediately.
    ///
    /// Stopwatches minted by the removed unit report zero from now on.
    ///
    /// # Errors
    ///
    /// Fails if the conductor is not paused, or if the key does not match a
    /// registered unit.
    pub fn remove_unit(&self, key: UnitKey) -> Result<()> {
        self.ensure_paused()?;

        let mut roster = self.core.roster.lock();
        let index = roster
            .units
            .iter()
            .position(|entry| entry.key == key)
            .ok_or_else(Error::unknown_unit)?;
        roster.units.remove(index);

        tracing::event!(
            name: "conductor.unit_removed",
            tracing::Level::DEBUG,
            key = key.0,
        );
        Ok(())
    }

    /// Pauses ticking.
    ///
    /// Pauses nest: each call must be matched by an
    /// [`unpause`][Self::unpause] before ticking resumes. A tick already in
    /// flight finishes; no new tick starts while paused.
    pub fn pause(&self) {
        let mut pause = self.core.pause.lock();
        pause.depth += 1;
        if pause.depth == 1
            && let Some(driver) = pause.driver.as_ref()
        {
            driver.pause();
        }
        tracing::event!(name: "conductor.pause", tracing::Level::DEBUG, depth = pause.depth);
    }

    /// Releases one level of pause, resuming ticking at level zero.
    ///
    /// A conductor starts at pause level one, so the first unpause starts
    /// it. Unpausing an already running conductor is a no-op.
    pub fn unpause(&self) {
        let mut pause = self.core.pause.lock();
        if pause.depth == 0 {
            return;
        }
        pause.depth -= 1;
        if pause.depth == 0 {
            if pause.driver.is_none() {
                let weak = Arc::downgrade(&self.core);
                pause.driver = Some(Metronome::new(self.core.base_period, move || {
                    tick_if_alive(&weak);
                }));
            }
            if let Some(driver) = pause.driver.as_ref() {
                driver.resume();
            }
        }
        tracing::event!(name: "conductor.unpause", tracing::Level::DEBUG, depth = pause.depth);
    }

    /// Returns whether the conductor is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.core.pause.lock().depth > 0
    }

    /// Runs one tick by hand.
    ///
    /// Behaves exactly like a driver-initiated tick: freezes the time,
    /// snapshots the input, fires every due unit, and publishes the output.
    /// Useful with a controllable [`Clock`] to test unit scheduling
    /// deterministically.
    ///
    /// # Errors
    ///
    /// Fails if the conductor is not paused; a manual tick must never race
    /// the background driver.
    pub fn step(&self) -> Result<()> {
        self.ensure_paused()?;
        self.core.run_turn();
        Ok(())
    }

    /// Returns the number of ticks completed so far.
    ///
    /// Never blocks, even while a tick is in flight.
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.core.turn.load(Ordering::Relaxed)
    }

    /// Locks and returns the shared input for reading and writing.
    ///
    /// The tick's input snapshot waits until the guard is dropped; keep the
    /// critical section short.
    #[must_use]
    pub fn input(&self) -> InputGuard<'_, I> {
        InputGuard(self.core.input.lock())
    }

    /// Locks and returns the shared output for reading.
    ///
    /// The tick's output write-back waits until the guard is dropped; copy
    /// the value out rather than holding the guard.
    #[must_use]
    pub fn output(&self) -> OutputGuard<'_, O> {
        OutputGuard(self.core.output.lock())
    }

    /// Installs a callback run at the start of every tick, with the input
    /// locked, before the snapshot is taken.
    ///
    /// Replaces any previously installed input trigger.
    pub fn set_input_trigger(&self, trigger: impl FnMut(&mut I) + Send + 'static) {
        *self.core.input_trigger.lock() = Some(Box::new(trigger));
    }

    /// Installs a callback run at the end of every tick with the tick's
    /// published output, after the output lock has been released.
    ///
    /// Replaces any previously installed output trigger.
    pub fn set_output_trigger(&self, trigger: impl FnMut(&O) + Send + 'static) {
        *self.core.output_trigger.lock() = Some(Box::new(trigger));
    }

    fn ensure_paused(&self) -> Result<()> {
        if self.core.pause.lock().depth == 0 {
            return Err(Error::not_paused());
        }
        Ok(())
    }
}

impl<I, O> Core<I, O>
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    fn run_turn(&self) {
        // Work on local copies so neither shared mutex is held while units
        // run.
        let mut local_output = self.output.lock().clone();

        let local_input = {
            // The input lock comes first; a thread holding an input guard
            // can still install triggers without blocking this tick.
            let mut input = self.input.lock();
            let mut trigger = self.input_trigger.lock();
            if let Some(trigger) = trigger.as_mut() {
                trigger(&mut input);
            }
            input.clone()
        };

        // One timestamp for the whole tick.
        let frozen = self.clock.instant();

        let turn = self.turn.load(Ordering::Relaxed);
        {
            // Only the roster lock is held while units run; it is never
            // held across an input or output acquisition.
            let mut roster = self.roster.lock();
            for entry in &mut roster.units {
                if turn % entry.divisor == 0 {
                    entry.unit.setup_turn(frozen);
                    entry.unit.tick(&local_input, &mut local_output);
                }
            }
        }
        self.turn.store(turn.wrapping_add(1), Ordering::Relaxed);

        *self.output.lock() = local_output.clone();

        let mut trigger = self.output_trigger.lock();
        if let Some(trigger) = trigger.as_mut() {
            trigger(&local_output);
        }
    }
}

fn tick_if_alive<I, O>(core: &Weak<Core<I, O>>)
where
    I: Clone + Send + 'static,
    O: Clone + Send + 'static,
{
    if let Some(core) = core.upgrade() {
        core.run_turn();
    }
}

impl<I, O> Clone for Conductor<I, O> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<I, O> fmt::Debug for Conductor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conductor")
            .field("base_period", &self.core.base_period)
            .field("units", &self.core.roster.lock().units.len())
            .field("paused", &(self.core.pause.lock().depth > 0))
            .finish_non_exhaustive()
    }
}
