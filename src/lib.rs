// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `gatehouse` is the firmware core of a network-controlled garage-door
//! opener.
//!
//! The device actuates physical access to a building over plain TCP, so
//! every byte on the wire is authenticated and confidential, and the device
//! resists replay even though the only secret is a single pre-shared
//! 128-bit key. The core consists of:
//!
//! - length-prefixed framing of *transmissions*;
//! - an encrypt-then-MAC envelope (AES-128-CBC + HMAC-SHA1) over every
//!   transmission, covering the length prefix and IV (see [`protocol`]);
//! - a challenge/response handshake that binds a short-lived *conversation*
//!   to a server-generated nonce (see [`server`]);
//! - a nonce generator that mixes a persistently-seeded 48-bit PRG with
//!   runtime entropy (see [`rng`]).
//!
//! Everything else — the door hardware, the network link, the system clock,
//! external flash — is reached through traits in [`hardware`], [`net`], and
//! [`server`], so the core can be bound to any integration, or to fakes for
//! testing.
//!
//! # Feature flags
//!
//! - `std` (default) pulls in the full Rust standard library. This is not
//!   necessary for any on-device use-cases, but is available for host-side
//!   tooling and tests.
//! - `soft` (default) enables the [`crypto::soft` module], which provides
//!   software implementations of the crypto engine traits used by
//!   `gatehouse`. This feature is not intended for on-device use-cases
//!   either.
//! - `log` (default) enables debug logging through the `log` facade; with
//!   the feature off, every log statement compiles out completely.
//! - `rotate-seed` persists an incremented seed index to flash on every
//!   boot; off by default to save flash write endurance.
//!
//! [`crypto::soft` module]: crypto/soft/index.html

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]

#[macro_use]
mod debug;

pub mod crypto;
pub mod hardware;
pub mod io;
pub mod net;
pub mod protocol;
pub mod rng;
pub mod server;
