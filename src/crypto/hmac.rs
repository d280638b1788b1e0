// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! HMAC-SHA1 authentication.
//!
//! Every transmission carries an HMAC-SHA1 trailer, and the conversation
//! token is itself an HMAC of the handshake challenge; this is the single
//! keyed-digest primitive the protocol uses.
//!
//! In general, users of this module should be pulling in [`EngineExt`],
//! which adds functions to [`Engine`] for more ergonomic usage, but which
//! would otherwise make it object-unsafe.

use static_assertions::assert_obj_safe;

/// The length, in bytes, of an HMAC-SHA1 digest.
pub const DIGEST_LEN: usize = 20;

/// An error returned by an HMAC operation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that the wrong size of digest was provided to
    /// [`Engine::finish_raw()`].
    WrongSize,

    /// Indicates that the engine was idle, but a write or finish operation
    /// was requested.
    Idle,

    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// An HMAC-SHA1 engine, which maintains the state for one digest.
///
/// Callers should not use the `raw` API directly; [`Hasher`] is a type-safe
/// wrapper that manages a session with an `Engine`.
///
/// Implementers only need to provide the "raw" form of the API; the
/// remaining functions are convenience helpers.
pub trait Engine {
    /// Begins a new HMAC operation with the given key, discarding any
    /// previous state.
    fn start_raw(&mut self, key: &[u8]) -> Result<(), Error>;

    /// Adds `data` to the HMAC state.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Completes the HMAC operation.
    ///
    /// `out` must be exactly [`DIGEST_LEN`] bytes long.
    ///
    /// Calling this function multiple times will have an unspecified effect.
    fn finish_raw(&mut self, out: &mut [u8]) -> Result<(), Error>;

    /// Completes the HMAC operation, and then compares it to `expected`.
    ///
    /// The comparison must take constant time with respect to the compared
    /// length. Returns `Ok(())` if the digests matched.
    ///
    /// Calling this function multiple times will have an unspecified effect.
    fn compare_raw(&mut self, expected: &[u8]) -> Result<(), Error>;
}
assert_obj_safe!(Engine);

/// Helpers for creating a [`Hasher`] from an [`Engine`].
pub trait EngineExt: Engine {
    /// Begins a new HMAC operation, using the given secret key.
    ///
    /// Implementers do not need to implement this function themselves.
    #[inline]
    fn new_hmac(&mut self, key: &[u8]) -> Result<Hasher<&mut Self>, Error> {
        self.start_raw(key)?;
        Ok(Hasher { engine: self })
    }

    /// Convenience helper for HMAC'ing a contiguous memory region.
    ///
    /// Implementers do not need to implement this function themselves.
    #[inline]
    fn contiguous_hmac(
        &mut self,
        key: &[u8],
        buf: &[u8],
        out: &mut [u8],
    ) -> Result<(), Error> {
        let mut h = self.new_hmac(key)?;
        h.write(buf)?;
        h.finish(out)
    }
}

impl<E: Engine + ?Sized> EngineExt for E {}

/// A helper for managing an HMAC operation with an [`Engine`].
///
/// Users should prefer to use this instead of calling [`Engine`]'s raw API
/// directly.
pub struct Hasher<E> {
    engine: E,
}

impl<E: Engine + ?Sized> Hasher<&mut E> {
    /// Adds `data` to the HMAC state.
    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.engine.write_raw(data)
    }

    /// Completes the HMAC operation, writing the result to `out`.
    pub fn finish(self, out: &mut [u8]) -> Result<(), Error> {
        self.engine.finish_raw(out)
    }

    /// Completes the HMAC operation, comparing the result to `expected` in
    /// constant time.
    pub fn expect(self, expected: &[u8]) -> Result<(), Error> {
        self.engine.compare_raw(expected)
    }
}
