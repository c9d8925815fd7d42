// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

//! A thermal soak cycle: a setpoint programmer and a PI controller running
//! at different rates over one shared plant.
//!
//! The programmer is an [`Automaton`] stepping through ramp, soak and done
//! phases every 500ms; the controller runs every 200ms and steers the heater
//! power toward the programmed setpoint. Both hang off a single conductor
//! with a 100ms base period, while the main thread plays the role of the
//! plant.

use std::time::Duration;

use cadence::{Automaton, Clock, Conductor, Pace, TimedUnit};

/// Measured plant temperature, degrees C.
type Reading = f32;

#[derive(Debug, Clone, Copy, Default)]
struct Command {
    setpoint: f32,
    power: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ramp,
    Soak,
    Done,
}

struct Programmer {
    auto: Automaton<Phase>,
    setpoint: f32,
}

impl TimedUnit<Reading, Command> for Programmer {
    fn pace(&mut self) -> &mut Pace {
        self.auto.pace_mut()
    }

    fn setup_turn(&mut self, frozen: std::time::Instant) {
        self.auto.begin_turn(frozen);
    }

    fn tick(&mut self, _reading: &Reading, command: &mut Command) {
        match self.auto.state() {
            Phase::Ramp => {
                // 5 degrees per second until the soak point.
                self.setpoint += 5.0 * self.auto.pace().last_period().as_secs_f32();
                if self.setpoint >= 60.0 {
                    self.setpoint = 60.0;
                    self.auto.set_state(Phase::Soak);
                }
            }
            Phase::Soak => {
                if self.auto.after_state_change() {
                    println!("programmer: soaking at {:.1} C", self.setpoint);
                }
                if self.auto.time_in_state() >= Duration::from_secs(4) {
                    self.setpoint = 20.0;
                    self.auto.set_state(Phase::Done);
                }
            }
            Phase::Done => {}
        }
        command.setpoint = self.setpoint;
    }
}

struct Controller {
    pace: Pace,
    integral: f32,
}

impl TimedUnit<Reading, Command> for Controller {
    fn pace(&mut self) -> &mut Pace {
        &mut self.pace
    }

    fn tick(&mut self, reading: &Reading, command: &mut Command) {
        let dt = self.pace.last_period().as_secs_f32();
        let error = command.setpoint - reading;
        self.integral = (self.integral + error * dt).clamp(-20.0, 20.0);
        command.power = (0.8 * error + 0.2 * self.integral).clamp(0.0, 100.0);
    }
}

fn main() -> cadence::Result<()> {
    let clock = Clock::new();
    let base = Duration::from_millis(100);
    let conductor = Conductor::new(&clock, 20.0_f32, Command::default(), base);

    // The programmer runs first so the controller sees this tick's setpoint.
    conductor.add_unit(
        Duration::from_millis(500),
        Box::new(Programmer {
            auto: Automaton::new(&clock, Phase::Ramp),
            setpoint: 20.0,
        }),
    )?;
    conductor.add_unit(
        Duration::from_millis(200),
        Box::new(Controller {
            pace: Pace::new(&clock),
            integral: 0.0,
        }),
    )?;

    conductor.unpause();

    // The main thread is the plant: heat in, losses out.
    let mut temperature = 20.0_f32;
    for i in 0..150 {
        let command = *conductor.output();
        temperature += (0.05 * command.power - 0.1 * (temperature - 20.0)) * base.as_secs_f32();
        *conductor.input() = temperature;

        if i % 10 == 0 {
            println!(
                "t={:>4.1}s  setpoint={:>5.1} C  temp={:>5.1} C  power={:>5.1}%",
                i as f32 * base.as_secs_f32(),
                command.setpoint,
                temperature,
                command.power,
            );
        }
        std::thread::sleep(base);
    }

    conductor.pause();
    Ok(())
}
