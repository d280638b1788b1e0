// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Uptime clock and stopwatch timer.

use core::time::Duration;

use static_assertions::assert_obj_safe;

/// Provides access to the device's millisecond uptime counter.
pub trait Clock {
    /// Returns the uptime of the device, i.e., the absolute duration since
    /// it was last released from reset.
    ///
    /// The resolution and accuracy of this value are expected to be
    /// best-effort, but it must be monotonic.
    fn uptime(&self) -> Duration;
}
assert_obj_safe!(Clock);

impl<C: Clock + ?Sized> Clock for &C {
    fn uptime(&self) -> Duration {
        C::uptime(*self)
    }
}

/// Returns the device uptime in milliseconds, truncated to 32 bits.
///
/// The truncation matches the width of the on-wire and in-entropy
/// representations of time; wraparound after ~49 days is expected and
/// harmless.
pub fn uptime_millis(clock: &impl Clock) -> u32 {
    clock.uptime().as_millis() as u32
}

/// A stopwatch timer measuring one fixed period against a [`Clock`].
///
/// A timer starts measuring the period with [`Timer::start()`], and
/// reports on whether the period has expired with [`Timer::is_elapsed()`].
/// Expiry latches: the first elapsed observation stops the timer, and a
/// stopped timer always reports elapsed. `start()` may be called again at
/// any time to re-arm.
pub struct Timer {
    period: Duration,
    state: State,
    deadline: Duration,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    Stopped,
    Running,
}

impl Timer {
    /// Creates a new, stopped timer with the given period.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: State::Stopped,
            deadline: Duration::ZERO,
        }
    }

    /// Starts (or re-starts) the timer.
    pub fn start(&mut self, clock: &impl Clock) {
        self.state = State::Running;
        self.deadline = clock.uptime() + self.period;
    }

    /// Returns whether the timer is currently running.
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Checks if the period has elapsed. If so, returns true and stops the
    /// timer.
    pub fn is_elapsed(&mut self, clock: &impl Clock) -> bool {
        let elapsed = match self.state {
            State::Running => clock.uptime() >= self.deadline,
            State::Stopped => true,
        };

        if elapsed {
            self.state = State::Stopped;
        }

        elapsed
    }
}

/// A [`Clock`] backed by [`std::time::Instant`].
#[cfg(feature = "std")]
pub struct SystemClock {
    epoch: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Creates a new `SystemClock` whose uptime starts now.
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn uptime(&self) -> Duration {
        self.epoch.elapsed()
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stopped_timer_reads_elapsed() {
        let clock = fake::Clock::new();
        let mut timer = Timer::new(Duration::from_millis(100));
        assert!(!timer.is_running());
        assert!(timer.is_elapsed(&clock));
    }

    #[test]
    fn elapse_latches_stop() {
        let clock = fake::Clock::new();
        let mut timer = Timer::new(Duration::from_millis(100));

        timer.start(&clock);
        assert!(timer.is_running());
        assert!(!timer.is_elapsed(&clock));

        clock.advance(99);
        assert!(!timer.is_elapsed(&clock));

        clock.advance(1);
        assert!(timer.is_elapsed(&clock));
        assert!(!timer.is_running());

        // Re-arming works after expiry.
        timer.start(&clock);
        assert!(timer.is_running());
        assert!(!timer.is_elapsed(&clock));
    }

    #[test]
    fn uptime_millis_truncates() {
        let clock = fake::Clock::new();
        clock.set(0x1_0000_0005);
        assert_eq!(uptime_millis(&clock), 5);
    }
}
