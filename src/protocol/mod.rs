// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The secure-channel wire protocol.
//!
//! Every unit on the wire is a *transmission*:
//!
//! ```text
//! offset size  field
//!   0     2    length (little-endian u16; total transmission size)
//!   2    16    IV
//!  18     *    AES-128-CBC ciphertext of the PKCS#7-padded payload
//!  18+*  20    HMAC-SHA1(PSK, bytes[0 .. 18+*])
//! ```
//!
//! The *payload* inside the ciphertext is one of:
//!
//! - the literal [`NEED_CHALLENGE`] (client to server), answered with a raw
//!   16-byte challenge;
//! - a 20-byte conversation token followed by an ASCII [`Command`] (client
//!   to server), answered with a [`DoorState`] name or the literal
//!   [`SESSION_EXPIRED`].
//!
//! This module defines the vocabulary; [`envelope`] implements the
//! encrypt-then-MAC codec around it.

use core::fmt;
use core::str;

use crate::crypto::hmac;
use crate::crypto::nonce;

pub mod envelope;

/// The maximum size of a transmission, on either direction of the wire.
///
/// A length prefix outside of `(0, MAX_TRANSMISSION_SIZE)` causes the
/// receive path to reset immediately.
pub const MAX_TRANSMISSION_SIZE: usize = 256;

/// The payload a client sends to initiate a handshake.
pub const NEED_CHALLENGE: &[u8] = b"NEED_CHALLENGE";

/// The payload the server sends when a commanded transmission does not
/// belong to a live conversation.
pub const SESSION_EXPIRED: &[u8] = b"SESSION_EXPIRED";

/// The length, in bytes, of a handshake challenge.
pub const CHALLENGE_LEN: usize = nonce::NONCE_LEN;

/// The length, in bytes, of a conversation token.
///
/// A token is `HMAC(PSK, challenge)`, so it is exactly one digest long.
pub const TOKEN_LEN: usize = hmac::DIGEST_LEN;

/// A conveinence macro for generating enums with ASCII wire names.
///
/// The commands and statuses of this protocol travel as their literal
/// ASCII names inside the encrypted payload. This macro generates the
/// enum together with `name`/`from_name`/`from_wire` conversions.
///
/// Syntax is as follows:
/// ```text
/// ascii_enum! {
///     /// This is my enum.
///     pub enum MyEnum {
///         /// Variant `A`.
///         A = "A",
///         /// Variant `B`.
///         B = "B",
///     }
/// }
/// ```
macro_rules! ascii_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident {
        $($(#[$meta_variant:meta])* $variant:ident = $value:tt,)*
    }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        $vis enum $name {
           $(
               $(#[$meta_variant])*
               $variant,
           )*
        }

        impl $name {
            /// Returns the ASCII wire name of `self`.
            pub fn name(self) -> &'static str {
                match self {
                    $(
                        Self::$variant => $value,
                    )*
                }
            }

            /// Attempts to parse a value of `Self` from its ASCII wire
            /// name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(
                        $value => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// Attempts to parse a value of `Self` from raw payload bytes.
            pub fn from_wire(bytes: &[u8]) -> Option<Self> {
                Self::from_name(str::from_utf8(bytes).ok()?)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.name())
            }
        }

        impl str::FromStr for $name {
            type Err = FromNameError;

            fn from_str(s: &str) -> Result<Self, FromNameError> {
                $name::from_name(s).ok_or(FromNameError)
            }
        }
    }
}

/// A deserialization-from-name error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FromNameError;

impl fmt::Display for FromNameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown variant")
    }
}

ascii_enum! {
    /// A command a client may issue within a live conversation.
    pub enum Command {
        /// Open the door, if it is closed.
        Open = "OPEN",
        /// Close the door, if it is open.
        Close = "CLOSE",
        /// Simulate a manual click of the wall button.
        PressButton = "PRESS_BUTTON",
        /// Report the door state without actuating anything.
        GetStatus = "GET_STATUS",
    }
}

ascii_enum! {
    /// The door state the consumer reports back to clients.
    pub enum DoorState {
        /// The door is fully open.
        Open = "DOOR_OPEN",
        /// The door is fully closed.
        Closed = "DOOR_CLOSED",
        /// The door is believed to be in motion.
        Moving = "DOOR_MOVING",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_names() {
        assert_eq!(Command::PressButton.name(), "PRESS_BUTTON");
        assert_eq!(Command::from_name("OPEN"), Some(Command::Open));
        assert_eq!(Command::from_name("open"), None);
        assert_eq!(
            Command::from_wire(b"GET_STATUS"),
            Some(Command::GetStatus)
        );
        assert_eq!(Command::from_wire(b"\xffGET_STATUS"), None);
    }

    #[test]
    fn door_state_parses() {
        let state: DoorState = "DOOR_MOVING".parse().unwrap();
        assert_eq!(state, DoorState::Moving);
        assert_eq!("BUSTED".parse::<DoorState>(), Err(FromNameError));
        assert_eq!(DoorState::Closed.to_string(), "DOOR_CLOSED");
    }
}
