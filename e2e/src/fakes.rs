// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Fake hardware for end-to-end tests.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use gatehouse::hardware::clock::SystemClock;
use gatehouse::hardware::clock::Timer;
use gatehouse::protocol::Command;
use gatehouse::protocol::DoorState;
use gatehouse::server::Consumer;

/// A simulated garage door.
///
/// The simulation mirrors the real door controller: actuating commands
/// "press the button", which starts a travel timer; while the timer
/// runs, the door reports [`DoorState::Moving`], and once it elapses
/// the sensor reads whichever end of the track the press sent the door
/// toward. Every known command is answered with the resulting door
/// state. Handles are `Clone`, so a test can hold one end while the
/// server drives the other.
#[derive(Clone)]
pub struct Door {
    inner: Arc<Mutex<Inner>>,
    commands_processed: Arc<AtomicUsize>,
}

struct Inner {
    clock: SystemClock,
    /// Estimate of how long it takes for the door to open and close.
    travel: Timer,
    /// What the position sensor will read once travel completes.
    sensor: DoorState,
}

impl Inner {
    fn status(&mut self) -> DoorState {
        if self.travel.is_running() && !self.travel.is_elapsed(&self.clock) {
            DoorState::Moving
        } else {
            self.sensor
        }
    }

    /// Simulates a manual click of the wall button.
    fn press(&mut self) {
        self.sensor = match self.sensor {
            DoorState::Open => DoorState::Closed,
            _ => DoorState::Open,
        };
        self.travel.start(&self.clock);
    }
}

impl Door {
    /// Creates a closed door with the real controller's travel time.
    pub fn new() -> Self {
        Self::with_travel_time(Duration::from_secs(15))
    }

    /// Creates a closed door that takes `travel_time` to open or close.
    pub fn with_travel_time(travel_time: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                clock: SystemClock::new(),
                travel: Timer::new(travel_time),
                sensor: DoorState::Closed,
            })),
            commands_processed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the current simulated state.
    pub fn state(&self) -> DoorState {
        self.inner.lock().unwrap().status()
    }

    /// Returns how many messages the consumer has accepted, unknown
    /// commands included.
    pub fn commands_processed(&self) -> usize {
        self.commands_processed.load(Ordering::SeqCst)
    }
}

impl Default for Door {
    fn default() -> Self {
        Self::new()
    }
}

impl Consumer for Door {
    fn process_message(
        &mut self,
        message: &[u8],
        response: &mut [u8],
    ) -> usize {
        self.commands_processed.fetch_add(1, Ordering::SeqCst);

        let command = match Command::from_wire(message) {
            Some(command) => command,
            // Only known commands get any kind of work or response.
            None => return 0,
        };
        log::info!("door received command: {}", command);

        let mut inner = self.inner.lock().unwrap();
        match command {
            Command::Open => {
                if inner.status() == DoorState::Closed {
                    inner.press();
                }
            }
            Command::Close => {
                if inner.status() == DoorState::Open {
                    inner.press();
                }
            }
            Command::PressButton => inner.press(),
            Command::GetStatus => {}
        }

        let reply = inner.status().name().as_bytes();
        response[..reply.len()].copy_from_slice(reply);
        reply.len()
    }
}
