/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! Timers.
//!
//! The interpreter's delay and sound timers count down once per call to
//! `Timers::tick`, which the host makes at 60 Hz no matter how many
//! instructions it runs per frame.  The `Clock` is the wall-clock side of
//! that arrangement, for hosts that need to know how many frames have passed.

use std::num::Wrapping;

use time;

/// The delay and sound timers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    /// The delay timer.
    pub delay: u8,
    /// The sound timer.
    pub sound: u8,
}

impl Timers {
    /// Returns a pair of timers, both at zero.
    pub fn new() -> Self {
        Timers::default()
    }

    /// Counts both timers down by one, stopping at zero.
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// Returns whether the sound timer is running (i.e. the buzzer should be
    /// on).
    pub fn tone_active(&self) -> bool {
        self.sound > 0
    }
}

/// A basic wall-clock timer.
#[derive(Debug)]
pub struct Clock {
    /// Whether the clock is enabled.
    enabled: bool,
    /// The frequency at which to run the clock.
    frequency: u32,
    /// An internal number of ticks.
    ticks: Wrapping<u32>,
}

impl Clock {
    /// Returns a new clock running at the given frequency.
    pub fn new(frequency: u32) -> Self {
        let mut clock = Clock::new_disabled(frequency);
        clock.enabled = true;
        clock.update();
        clock
    }

    /// Returns a new clock at the given frequency which is disabled.
    pub fn new_disabled(frequency: u32) -> Self {
        Clock {
            enabled: false,
            frequency,
            ticks: Wrapping(0),
        }
    }

    /// Returns the frequency of the clock, in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Returns the number of ticks which have elapsed since the last call to
    /// this method (or the creation of the clock).
    ///
    /// If the clock is disabled, this always returns 0 and doesn't actually do
    /// anything else.
    pub fn lap(&mut self) -> u32 {
        if self.enabled {
            let old = self.ticks;
            self.update();
            (self.ticks - old).0
        } else {
            0
        }
    }

    /// Updates the internal tick count from the system clock.
    ///
    /// Float to integer casts saturate, so the count goes through `u64` to
    /// get a wrapping `u32`.
    fn update(&mut self) {
        let ticks = time::precise_time_ns() as f64 * self.frequency as f64 / 1e9;
        self.ticks = Wrapping(ticks as u64 as u32);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use timer::{Clock, Timers};

    /// Timers must count down by exactly one per tick and then stay at zero.
    #[test]
    fn timers_count_down_to_zero() {
        // Test cases, in the format (delay, sound).
        let cases = [(0u8, 0u8), (1, 0), (3, 7), (255, 2), (10, 10)];

        for &(delay, sound) in cases.iter() {
            let mut timers = Timers { delay, sound };

            for n in 1..300u32 {
                timers.tick();
                let expect = |start: u8| if n >= start as u32 { 0 } else { start - n as u8 };
                assert_eq!(timers.delay, expect(delay), "case {:?}, tick {}", (delay, sound), n);
                assert_eq!(timers.sound, expect(sound), "case {:?}, tick {}", (delay, sound), n);
            }
        }
    }

    #[test]
    fn tone_follows_sound_timer() {
        let mut timers = Timers::new();
        assert!(!timers.tone_active());

        timers.sound = 2;
        assert!(timers.tone_active());
        timers.tick();
        assert!(timers.tone_active());
        timers.tick();
        assert!(!timers.tone_active());
    }

    #[test]
    fn disabled_clock_never_ticks() {
        let mut clock = Clock::new_disabled(1000);
        thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.lap(), 0);
    }

    #[test]
    fn clock_ticks() {
        let mut clock = Clock::new(1000);
        thread::sleep(Duration::from_millis(20));
        assert!(clock.lap() >= 10);
    }
}
