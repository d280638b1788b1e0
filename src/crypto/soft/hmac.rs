// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of [`crypto::hmac`] based on the `hmac` and `sha1`
//! crates.

// `::hmac` the crate vs `crypto::hmac` the trait module; the leading
// colons keep the two apart.
use ::hmac::Mac as _;
use sha1::Sha1;

use crate::crypto::hmac;

#[cfg(doc)]
use crate::crypto;

type Inner = ::hmac::Hmac<Sha1>;

/// A software [`hmac::Engine`].
pub struct HmacSha1 {
    inner: Option<Inner>,
}

impl HmacSha1 {
    /// Creates a new, idle `HmacSha1`.
    pub fn new() -> Self {
        Self { inner: None }
    }
}

impl Default for HmacSha1 {
    fn default() -> Self {
        Self::new()
    }
}

impl hmac::Engine for HmacSha1 {
    fn start_raw(&mut self, key: &[u8]) -> Result<(), hmac::Error> {
        let mac = Inner::new_from_slice(key)
            .map_err(|_| hmac::Error::Unspecified)?;
        self.inner = Some(mac);
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), hmac::Error> {
        match &mut self.inner {
            Some(mac) => {
                mac.update(data);
                Ok(())
            }
            None => Err(hmac::Error::Idle),
        }
    }

    fn finish_raw(&mut self, out: &mut [u8]) -> Result<(), hmac::Error> {
        check!(out.len() == hmac::DIGEST_LEN, hmac::Error::WrongSize);
        match self.inner.take() {
            Some(mac) => {
                out.copy_from_slice(&mac.finalize().into_bytes());
                Ok(())
            }
            None => Err(hmac::Error::Idle),
        }
    }

    fn compare_raw(&mut self, expected: &[u8]) -> Result<(), hmac::Error> {
        check!(expected.len() == hmac::DIGEST_LEN, hmac::Error::WrongSize);
        match self.inner.take() {
            // verify_slice() is a constant-time comparison.
            Some(mac) => mac
                .verify_slice(expected)
                .map_err(|_| hmac::Error::Unspecified),
            None => Err(hmac::Error::Idle),
        }
    }
}
