// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests for `gatehouse`.
//!
//! This crate serves two major purposes:
//! 1. To provide an easy way to black-box test `gatehouse`: the tests in
//!    here drive a real server over a real TCP socket with real crypto,
//!    byte-for-byte the way a remote client would.
//! 2. To provide an example *integration* for platform integrators to
//!    understand how to assemble a working device out of `gatehouse`'s
//!    toolkit: a channel binding, a consumer, a clock, and the rest.
//!
//! Running the binary starts a server with a simulated door, which is
//! handy for poking at the protocol with external clients.

#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]
#![deny(missing_docs)]

use structopt::StructOpt;

pub mod fakes;
pub mod server;
pub mod tcp;

#[cfg(test)]
mod tests {
    mod scenarios;
    pub mod support;
}

/// End-to-end tests for gatehouse.
#[derive(Debug, StructOpt)]
struct Options {
    /// Port to listen on.
    #[structopt(long, default_value = "6666")]
    port: u16,

    /// Conversation duration, in milliseconds.
    #[structopt(long, default_value = "5000")]
    conversation_duration: u64,
}

fn main() {
    let pid = std::process::id();
    env_logger::builder()
        .format(move |buf, record| {
            use std::io::Write;
            for line in record.args().to_string().trim().lines() {
                writeln!(
                    buf,
                    "[{level}{pid} {file}:{line}] {msg}",
                    level = record.level().to_string().chars().next().unwrap(),
                    pid = pid,
                    file = record.file().unwrap_or("?.rs"),
                    line = record.line().unwrap_or(0),
                    msg = line,
                )?;
            }
            Ok(())
        })
        .init();

    let opts = Options::from_args();
    let door = fakes::Door::new();
    log::info!("serving on port {}", opts.port);
    server::serve(server::Options {
        port: opts.port,
        psk: *server::TEST_PSK.as_bytes(),
        conversation_duration: std::time::Duration::from_millis(
            opts.conversation_duration,
        ),
        door,
    });
}
