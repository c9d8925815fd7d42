// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

//! A ring of relays passing a token through the shared output.
//!
//! Every relay watches its predecessor's lap counter in the shared output.
//! When the predecessor pulls ahead, the relay starts a [`Stopwatch`] and,
//! after a one second dwell, bumps its own counter, handing the token to the
//! next relay. Relay zero seeds the first lap.

use std::time::Duration;

use cadence::{Clock, Conductor, Pace, Stopwatch, TimedUnit};

const RELAYS: usize = 20;
const DWELL: Duration = Duration::from_secs(1);

struct Relay {
    index: usize,
    pace: Pace,
    dwell: Stopwatch,
}

impl Relay {
    fn armed(&self, laps: &[u64]) -> bool {
        let predecessor = laps[(self.index + RELAYS - 1) % RELAYS];
        // Relay zero leads the ring; everyone else chases their neighbor.
        if self.index == 0 {
            predecessor == laps[0]
        } else {
            predecessor > laps[self.index]
        }
    }
}

impl TimedUnit<(), Vec<u64>> for Relay {
    fn pace(&mut self) -> &mut Pace {
        &mut self.pace
    }

    fn tick(&mut self, (): &(), laps: &mut Vec<u64>) {
        if !self.armed(laps) {
            self.dwell.deactivate();
            return;
        }
        if !self.dwell.is_active() {
            self.dwell = self.pace.stopwatch();
        }
        if self.dwell.elapsed() >= DWELL {
            laps[self.index] += 1;
            self.dwell.deactivate();
            println!("relay {:>2} completed lap {}", self.index, laps[self.index]);
        }
    }
}

fn main() -> cadence::Result<()> {
    let clock = Clock::new();
    let conductor = Conductor::new(
        &clock,
        (),
        vec![0_u64; RELAYS],
        Duration::from_millis(500),
    );

    for index in 0..RELAYS {
        conductor.add_unit(
            Duration::from_millis(500),
            Box::new(Relay {
                index,
                pace: Pace::new(&clock),
                dwell: Stopwatch::default(),
            }),
        )?;
    }

    conductor.unpause();
    std::thread::sleep(Duration::from_secs(30));
    conductor.pause();

    let laps = conductor.output().clone();
    println!("final laps: {laps:?}");
    Ok(())
}
