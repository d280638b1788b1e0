// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The secure-channel server.
//!
//! A `gatehouse` "server" is the software on the device end of the
//! channel: it receives encrypted transmissions, runs the handshake and
//! conversation bookkeeping, and delegates decrypted commands to a
//! [`Consumer`] — the component that actually moves the door.
//!
//! Nothing the server does ever produces a typed error on the wire. A
//! transmission either earns a valid encrypted reply, earns an encrypted
//! `SESSION_EXPIRED`, or earns silence. Silence under adversarial input is
//! the entire error-reporting policy; the distinctions below exist only
//! for the host's debug channel.

use static_assertions::assert_obj_safe;

use crate::net;
use crate::protocol::envelope;

mod secure_channel;

pub use secure_channel::Options;
pub use secure_channel::SecureChannel;
pub use secure_channel::DEFAULT_CONVERSATION_DURATION;

/// A server error.
///
/// These are returned from [`SecureChannel::step()`] strictly for the
/// host's benefit (logging, counters); by the time one is returned, the
/// receive path has already been reset and the wire has already seen
/// whatever it is going to see.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// The length field, ciphertext alignment, or total size of a
    /// transmission was invalid.
    MalformedFrame,
    /// A transmission failed MAC verification.
    BadMac,
    /// A transmission decrypted to an invalid PKCS#7 padding.
    BadPadding,
    /// The consumer did not recognize the command; no reply was sent.
    UnknownCommand,
    /// A commanded transmission arrived outside a live conversation;
    /// `SESSION_EXPIRED` was sent.
    SessionInvalid,
    /// The channel failed underneath the server.
    Channel(net::Error),
    /// A crypto engine or the nonce source failed internally.
    Internal,
}

impl From<net::Error> for Error {
    fn from(e: net::Error) -> Self {
        Self::Channel(e)
    }
}

impl From<envelope::Error> for Error {
    fn from(e: envelope::Error) -> Self {
        match e {
            envelope::Error::MalformedFrame => Self::MalformedFrame,
            envelope::Error::BadMac => Self::BadMac,
            envelope::Error::BadPadding => Self::BadPadding,
            envelope::Error::PayloadTooLarge | envelope::Error::Crypto => {
                Self::Internal
            }
        }
    }
}

/// The consumer of decrypted messages.
///
/// The server hands every in-conversation payload to a `Consumer`, which
/// interprets it, performs whatever side effects it implies against the
/// door hardware, and writes an ASCII status reply into `response`.
///
/// Returning `0` means "do not reply"; this is how unknown commands are
/// ignored. Implementations must be fast enough to complete within a
/// single server tick — blocking here stalls the whole device.
pub trait Consumer {
    /// Processes one decrypted message, writing the reply into `response`
    /// and returning its length.
    fn process_message(
        &mut self,
        message: &[u8],
        response: &mut [u8],
    ) -> usize;
}
assert_obj_safe!(Consumer);
