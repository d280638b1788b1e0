// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Software implementations of the crypto engine traits, based on the
//! RustCrypto crates.
//!
//! These are suitable for host-side tooling, tests, and integrations whose
//! platform has no crypto hardware worth plugging in.

pub mod cipher;
pub mod hmac;

pub use self::cipher::Aes128Cbc;
pub use self::hmac::HmacSha1;
