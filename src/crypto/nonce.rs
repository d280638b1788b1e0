// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Nonce generation.
//!
//! The protocol consumes 16-byte nonces in two places: as the CBC
//! initialization vector of every outgoing transmission, and as the
//! handshake challenge that a conversation is bound to. This module
//! provides the object-safe trait those consumers pull from.
//!
//! The device has no hardware RNG; the production implementation is
//! [`rng::ChallengeRng`], which expands a persistently-seeded PRG with
//! runtime entropy. Hosts with an OS entropy source can substitute their
//! own implementation.
//!
//! [`rng::ChallengeRng`]: ../../rng/struct.ChallengeRng.html

use static_assertions::assert_obj_safe;

/// The length, in bytes, of a generated nonce.
pub const NONCE_LEN: usize = 16;

/// An error returned by a nonce source.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// A source of 16-byte nonces.
///
/// The sole purpose of this type is to fill buffers with values that are
/// unpredictable to a remote adversary without the pre-shared key, and
/// non-repeating across boots with high probability.
pub trait Source {
    /// Fills `out` with a fresh nonce.
    fn next_nonce(&mut self, out: &mut [u8; NONCE_LEN]) -> Result<(), Error>;
}
assert_obj_safe!(Source);
