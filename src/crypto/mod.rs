// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Pluggable cryptography traits.
//!
//! `gatehouse` requires cryptographic primitives to function: AES-128-CBC
//! for confidentiality, HMAC-SHA1 for authentication, and a nonce source
//! for IVs and challenges. This module provides object-safe traits that
//! abstract over those operations.
//!
//! Integrators are expected to provide their own implementations of these
//! traits, which may suit particular hardware needs that `gatehouse` cannot
//! fulfill.
//!
//! It is recommended to not import the traits in this module directly,
//! since several of them have the same name. Instead, use imports like
//! `use gatehouse::crypto::hmac;` and partially-qualified names like
//! `hmac::Engine`.
//!
//! Software implementations of these traits are provided under the
//! [`soft` module], based on the RustCrypto crates. Their presence is
//! controlled by the `soft` feature flag.
//!
//! [`soft` module]: soft/index.html

pub mod cipher;
pub mod hmac;
pub mod nonce;
pub mod psk;

#[cfg(feature = "soft")]
pub mod soft;

pub use psk::Psk;
