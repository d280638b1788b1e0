// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Networking interfaces.
//!
//! This module provides a generic, abstract byte-transport interface. The
//! term "network" is used very loosely: for our purposes, a network is an
//! object that can move opaque byte buffers toward and from a single peer.
//! The reference deployment listens on a TCP socket behind the building's
//! WiFi link, but the core works over any transport that can honor the
//! [`Channel`] contract.

use static_assertions::assert_obj_safe;

use crate::io;

/// A networking error.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates an underlying I/O error.
    Io(io::Error),
    /// Indicates that the other end of a connection is "disconnected". This
    /// can mean anything from a connection being explicitly terminated, to
    /// some internal timeout expiring.
    Disconnected,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// An abstract byte transport.
///
/// The transport is strictly non-blocking, and reads are atomic: a call to
/// [`Channel::read()`] either produces every requested byte or none of
/// them, immediately. The session state machine leans on this to never own
/// the caller's thread for longer than one read/write pair.
pub trait Channel {
    /// Establishes the link.
    ///
    /// Called by the host once, before the first read or write. What
    /// "establishing" means is up to the implementation (e.g., associating
    /// to an access point and opening a listening socket).
    fn open(&mut self) -> Result<(), Error>;

    /// Attempts to read exactly `buf.len()` bytes into `buf`.
    ///
    /// Returns the number of bytes read, which must be either `buf.len()`
    /// or `0` — never a partial count. Returning `0` means "try again on a
    /// later tick"; it is not an error.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Writes `buf` to the peer, best-effort.
    ///
    /// Returns the number of bytes written. Short writes are not retried
    /// by the core.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error>;
}
assert_obj_safe!(Channel);
