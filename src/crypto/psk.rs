// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The pre-shared key.

use core::fmt;

/// The length, in bytes, of the pre-shared key.
pub const KEY_LEN: usize = 16;

/// The 128-bit pre-shared symmetric key.
///
/// The same key is used as the AES-128-CBC key and as the HMAC-SHA1 key.
/// It is read-only for the lifetime of the process: the application root
/// constructs one at boot and hands out shared references.
///
/// The `Debug` impl is redacted, so a `Psk` can never leak through a log
/// statement.
#[derive(Clone)]
pub struct Psk([u8; KEY_LEN]);

impl Psk {
    /// Wraps raw key material.
    pub const fn new(key: [u8; KEY_LEN]) -> Self {
        Self(key)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for Psk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Psk(<redacted>)")
    }
}
