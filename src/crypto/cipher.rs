// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! AES-128-CBC encryption.

use static_assertions::assert_obj_safe;

/// The AES block length, in bytes.
pub const BLOCK_LEN: usize = 16;

/// The length, in bytes, of a CBC initialization vector.
pub const IV_LEN: usize = BLOCK_LEN;

/// An error returned by a cipher operation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that the buffer handed to the engine was not a whole
    /// number of blocks.
    NotAligned,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// An AES-128-CBC engine.
///
/// Both operations work in place: the buffer must already be padded to a
/// whole number of blocks, and its contents are replaced with the
/// ciphertext (resp. plaintext). Padding is the caller's concern; the
/// envelope codec applies and validates PKCS#7 itself.
pub trait Engine {
    /// Encrypts `buf` in place with AES-128-CBC under `key` and `iv`.
    fn encrypt(
        &mut self,
        key: &[u8; 16],
        iv: &[u8; IV_LEN],
        buf: &mut [u8],
    ) -> Result<(), Error>;

    /// Decrypts `buf` in place with AES-128-CBC under `key` and `iv`.
    fn decrypt(
        &mut self,
        key: &[u8; 16],
        iv: &[u8; IV_LEN],
        buf: &mut [u8],
    ) -> Result<(), Error>;
}
assert_obj_safe!(Engine);
