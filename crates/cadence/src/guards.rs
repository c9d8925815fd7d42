// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::MutexGuard;

/// Scoped mutable access to the conductor's shared input.
///
/// Created by [`Conductor::input`][crate::Conductor::input]. While the guard
/// is alive it holds the input mutex, which blocks the tick's input exchange
/// step; release it (by dropping) as soon as possible. Dropping the guard is
/// the only release mechanism.
///
/// The guard is a unique capability: it cannot be cloned, but it can be
/// moved, and the lock stays held until the final owner drops it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cadence::{Clock, Conductor};
///
/// let clock = Clock::new();
/// let conductor = Conductor::new(&clock, 0_u32, 0_u32, Duration::from_millis(100));
///
/// *conductor.input() = 42;
/// assert_eq!(*conductor.input(), 42);
/// ```
pub struct InputGuard<'a, I>(pub(crate) MutexGuard<'a, I>);

impl<I> Deref for InputGuard<'_, I> {
    type Target = I;

    fn deref(&self) -> &I {
        &self.0
    }
}

impl<I> DerefMut for InputGuard<'_, I> {
    fn deref_mut(&mut self) -> &mut I {
        &mut self.0
    }
}

impl<I: fmt::Debug> fmt::Debug for InputGuard<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InputGuard").field(&*self.0).finish()
    }
}

/// Scoped read-only access to the conductor's shared output.
///
/// Created by [`Conductor::output`][crate::Conductor::output]. While the
/// guard is alive it holds the output mutex, which blocks the tick's output
/// write-back; release it (by dropping) as soon as possible. To keep the
/// value longer, copy it out and drop the guard.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cadence::{Clock, Conductor};
///
/// let clock = Clock::new();
/// let conductor = Conductor::new(&clock, (), 7_u32, Duration::from_millis(100));
///
/// let snapshot = *conductor.output();
/// assert_eq!(snapshot, 7);
/// ```
pub struct OutputGuard<'a, O>(pub(crate) MutexGuard<'a, O>);

impl<O> Deref for OutputGuard<'_, O> {
    type Target = O;

    fn deref(&self) -> &O {
        &self.0
    }
}

impl<O: fmt::Debug> fmt::Debug for OutputGuard<'_, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OutputGuard").field(&*self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{Clock, Conductor};

    #[test]
    fn input_guard_allows_mutation() {
        let clock = Clock::new_frozen();
        let conductor = Conductor::new(&clock, 1_u32, (), Duration::from_millis(10));

        {
            let mut input = conductor.input();
            *input += 9;
        }

        assert_eq!(*conductor.input(), 10);
    }

    #[test]
    fn guards_can_be_moved() {
        let clock = Clock::new_frozen();
        let conductor = Conductor::new(&clock, 5_u32, 6_u32, Duration::from_millis(10));

        let input = conductor.input();
        let moved = input;
        assert_eq!(*moved, 5);

        let output = conductor.output();
        let moved = output;
        assert_eq!(*moved, 6);
    }

    #[test]
    fn debug_formats_the_inner_value() {
        let clock = Clock::new_frozen();
        let conductor = Conductor::new(&clock, 5_u32, 6_u32, Duration::from_millis(10));

        assert_eq!(format!("{:?}", conductor.input()), "InputGuard(5)");
        assert_eq!(format!("{:?}", conductor.output()), "OutputGuard(6)");
    }
}
