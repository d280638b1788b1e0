// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The encrypt-then-MAC transmission envelope.
//!
//! [`seal()`] turns a plaintext payload into a complete transmission;
//! [`open()`] validates and strips one. The MAC covers every byte that
//! precedes it — the length prefix and the IV included — so
//! length-truncation and IV-swap games cannot produce a valid trailer, and
//! it is verified *before* any decryption is attempted.
//!
//! Nothing in this module decides what to do about a bad frame; the
//! session layer drops them silently, precisely so the device cannot be
//! used as a decryption oracle.

use core::convert::TryInto as _;

use crate::crypto::cipher;
use crate::crypto::hmac;
use crate::crypto::hmac::EngineExt as _;
use crate::crypto::nonce;
use crate::crypto::Psk;
use crate::io;
use crate::io::Cursor;
use crate::io::ReadInt as _;
use crate::io::Write as _;
use crate::protocol::MAX_TRANSMISSION_SIZE;

/// The length, in bytes, of the length prefix.
pub const LENGTH_LEN: usize = 2;

/// The length, in bytes, of everything that precedes the ciphertext.
pub const HEADER_LEN: usize = LENGTH_LEN + cipher::IV_LEN;

/// The smallest well-formed transmission: header, one ciphertext block,
/// and the MAC trailer.
pub const MIN_TRANSMISSION_SIZE: usize =
    HEADER_LEN + cipher::BLOCK_LEN + hmac::DIGEST_LEN;

/// The largest padded plaintext that fits in a transmission.
pub const MAX_PADDED_LEN: usize =
    (MAX_TRANSMISSION_SIZE - HEADER_LEN - hmac::DIGEST_LEN)
        / cipher::BLOCK_LEN
        * cipher::BLOCK_LEN;

/// The largest payload that [`seal()`] accepts.
///
/// Padding always adds at least one byte, so this is one less than
/// [`MAX_PADDED_LEN`].
pub const MAX_PAYLOAD_LEN: usize = MAX_PADDED_LEN - 1;

/// An envelope error.
///
/// Note that integrity failures are reported as [`Error::BadMac`] and
/// nothing else; distinguishing *why* a trailer failed to verify would
/// hand an attacker a side channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// The payload cannot fit in a single transmission.
    PayloadTooLarge,
    /// The length field, ciphertext alignment, or total size is invalid.
    MalformedFrame,
    /// The MAC trailer did not verify.
    BadMac,
    /// The PKCS#7 check failed after decryption.
    BadPadding,
    /// A crypto engine or nonce source failed internally.
    Crypto,
}

impl From<cipher::Error> for Error {
    fn from(_: cipher::Error) -> Self {
        Self::Crypto
    }
}

impl From<hmac::Error> for Error {
    fn from(_: hmac::Error) -> Self {
        Self::Crypto
    }
}

impl From<nonce::Error> for Error {
    fn from(_: nonce::Error) -> Self {
        Self::Crypto
    }
}

impl From<io::Error> for Error {
    fn from(_: io::Error) -> Self {
        Self::Crypto
    }
}

/// A borrowed view of one transmission, split into its fields.
///
/// Parsing only checks the *shape* of the buffer: sizes, alignment, and
/// agreement between the length field and the actual byte count. It says
/// nothing about whether the MAC verifies.
pub struct Transmission<'wire> {
    /// The CBC initialization vector.
    pub iv: &'wire [u8; cipher::IV_LEN],
    /// The ciphertext; a whole number of blocks.
    pub ciphertext: &'wire [u8],
    /// The HMAC-SHA1 trailer.
    pub mac: &'wire [u8; hmac::DIGEST_LEN],
}

impl<'wire> Transmission<'wire> {
    /// Parses `buf` as a complete transmission.
    pub fn parse(buf: &'wire [u8]) -> Result<Self, Error> {
        check!(buf.len() >= MIN_TRANSMISSION_SIZE, Error::MalformedFrame);
        check!(buf.len() <= MAX_TRANSMISSION_SIZE, Error::MalformedFrame);

        let mut reader = buf;
        let length = reader
            .read_le::<u16>()
            .map_err(|_| Error::MalformedFrame)? as usize;
        check!(length == buf.len(), Error::MalformedFrame);

        let ciphertext_len = length - HEADER_LEN - hmac::DIGEST_LEN;
        check!(
            ciphertext_len % cipher::BLOCK_LEN == 0,
            Error::MalformedFrame
        );

        let iv = buf[LENGTH_LEN..HEADER_LEN]
            .try_into()
            .map_err(|_| Error::MalformedFrame)?;
        let mac = buf[length - hmac::DIGEST_LEN..]
            .try_into()
            .map_err(|_| Error::MalformedFrame)?;

        Ok(Self {
            iv,
            ciphertext: &buf[HEADER_LEN..length - hmac::DIGEST_LEN],
            mac,
        })
    }
}

/// Seals `payload` into a complete transmission in `out`.
///
/// A fresh IV is drawn from `rng`; the payload is PKCS#7-padded (always at
/// least one byte), encrypted, framed, and authenticated. Returns the
/// total transmission length.
pub fn seal(
    payload: &[u8],
    psk: &Psk,
    rng: &mut (impl nonce::Source + ?Sized),
    cipher: &mut (impl cipher::Engine + ?Sized),
    hmac: &mut (impl hmac::Engine + ?Sized),
    out: &mut [u8],
) -> Result<usize, Error> {
    check!(payload.len() <= MAX_PAYLOAD_LEN, Error::PayloadTooLarge);

    let pad = cipher::BLOCK_LEN - payload.len() % cipher::BLOCK_LEN;
    let padded_len = payload.len() + pad;
    let total = HEADER_LEN + padded_len + hmac::DIGEST_LEN;

    let mut iv = [0; cipher::IV_LEN];
    rng.next_nonce(&mut iv)?;

    let mut cursor = Cursor::new(out);
    cursor.write_le(total as u16)?;
    cursor.write_bytes(&iv)?;
    cursor.write_bytes(payload)?;
    for byte in cursor.consume(pad)? {
        *byte = pad as u8;
    }

    let body = cursor.consumed_bytes_mut();
    cipher.encrypt(psk.as_bytes(), &iv, &mut body[HEADER_LEN..])?;

    let mut mac = [0; hmac::DIGEST_LEN];
    hmac.contiguous_hmac(psk.as_bytes(), cursor.consumed_bytes(), &mut mac)?;
    cursor.write_bytes(&mac)?;

    Ok(cursor.consumed_len())
}

/// Opens the transmission in `buf`, returning the payload.
///
/// The MAC is verified, in constant time, before anything is decrypted;
/// decryption happens in place, so `buf` is clobbered either way.
pub fn open<'wire>(
    buf: &'wire mut [u8],
    psk: &Psk,
    cipher: &mut (impl cipher::Engine + ?Sized),
    hmac: &mut (impl hmac::Engine + ?Sized),
) -> Result<&'wire [u8], Error> {
    let mut iv = [0; cipher::IV_LEN];
    {
        let parsed = Transmission::parse(buf)?;
        iv.copy_from_slice(parsed.iv);

        let mut h = hmac.new_hmac(psk.as_bytes()).map_err(|_| Error::BadMac)?;
        h.write(&buf[..buf.len() - hmac::DIGEST_LEN])
            .map_err(|_| Error::BadMac)?;
        h.expect(parsed.mac).map_err(|_| Error::BadMac)?;
    }

    let mac_offset = buf.len() - hmac::DIGEST_LEN;
    let ciphertext = &mut buf[HEADER_LEN..mac_offset];
    cipher.decrypt(psk.as_bytes(), &iv, ciphertext)?;

    let pad = match ciphertext.last() {
        Some(&byte) => byte as usize,
        None => return Err(Error::BadPadding),
    };
    check!(pad >= 1 && pad <= cipher::BLOCK_LEN, Error::BadPadding);
    check!(
        ciphertext[ciphertext.len() - pad..]
            .iter()
            .all(|&byte| byte == pad as u8),
        Error::BadPadding
    );
    let payload_len = ciphertext.len() - pad;

    Ok(&buf[HEADER_LEN..HEADER_LEN + payload_len])
}
