// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Assembly of a complete, running device.
//!
//! This is the example integration: every collaborator the core asks
//! for — channel, consumer, nonce source, crypto engines, clock — is
//! instantiated here and wired into a [`SecureChannel`], which is then
//! stepped from a plain loop exactly the way device firmware steps it.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use gatehouse::crypto::soft::Aes128Cbc;
use gatehouse::crypto::soft::HmacSha1;
use gatehouse::crypto::Psk;
use gatehouse::hardware::clock::SystemClock;
use gatehouse::net::Channel as _;
use gatehouse::rng::seeds;
use gatehouse::rng::ChallengeRng;
use gatehouse::rng::DisabledProbe;
use gatehouse::server::Options as ServerOptions;
use gatehouse::server::SecureChannel;

use crate::fakes;
use crate::tcp::TcpChannel;

/// The key every test device and test client shares.
pub const TEST_PSK: Psk = Psk::new(*b"gatehouse e2e ky");

/// Options for serving a device.
pub struct Options {
    /// Port to listen on; 0 picks an ephemeral port.
    pub port: u16,
    /// The pre-shared key.
    pub psk: [u8; 16],
    /// How long a conversation stays valid.
    pub conversation_duration: Duration,
    /// The simulated door.
    pub door: fakes::Door,
}

/// Serves a device forever on the current thread.
pub fn serve(opts: Options) -> ! {
    let stop = Arc::new(AtomicBool::new(false));
    let (port_tx, _port_rx) = mpsc::channel();
    run(opts, stop, port_tx);
    unreachable!("server loop only exits when stopped");
}

/// A server running on a background thread.
pub struct SpawnedServer {
    /// The port the server is listening on.
    pub port: u16,
    stop: Arc<AtomicBool>,
    handle: std::thread::JoinHandle<()>,
}

impl SpawnedServer {
    /// Stops the server and waits for the loop to wind down.
    pub fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

/// Spawns a server on a background thread, returning once it is
/// listening.
pub fn spawn(opts: Options) -> SpawnedServer {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_signal = Arc::clone(&stop);
    let (port_tx, port_rx) = mpsc::channel();

    let handle = std::thread::spawn(move || {
        run(opts, stop_signal, port_tx);
    });
    let port = port_rx.recv().expect("server failed to start");

    SpawnedServer { port, stop, handle }
}

fn run(opts: Options, stop: Arc<AtomicBool>, port_tx: mpsc::Sender<u16>) {
    let psk = Psk::new(opts.psk);
    let clock = SystemClock::new();

    // A RAM-backed flash image standing in for the device's external
    // flash, provisioned with an arbitrary seed table.
    let mut flash_image =
        vec![0x5au8; seeds::CURRENT_SEED_INDEX_ADDRESS as usize + 2];
    let index_at = seeds::CURRENT_SEED_INDEX_ADDRESS as usize;
    flash_image[index_at..].copy_from_slice(&1u16.to_le_bytes());

    let mut rng = ChallengeRng::new(
        &mut flash_image[..],
        HmacSha1::new(),
        DisabledProbe,
        &clock,
        &psk,
    );

    let mut channel = TcpChannel::new(opts.port);
    channel.open().expect("failed to open channel");
    let port = channel.local_port().expect("channel has no port");
    let _ = port_tx.send(port);

    let mut door = opts.door;
    let mut cipher = Aes128Cbc;
    let mut hmac = HmacSha1::new();
    let mut server = SecureChannel::new(ServerOptions {
        channel: &mut channel,
        consumer: &mut door,
        rng: &mut rng,
        cipher: &mut cipher,
        hmac: &mut hmac,
        clock: &clock,
        psk: &psk,
        conversation_duration: opts.conversation_duration,
    });

    while !stop.load(Ordering::SeqCst) {
        if let Err(e) = server.step() {
            log::info!("step reported {:?}", e);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}
