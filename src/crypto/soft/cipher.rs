// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of [`crypto::cipher`] based on the `aes` and `cbc`
//! crates.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::BlockDecryptMut as _;
use aes::cipher::BlockEncryptMut as _;
use aes::cipher::KeyIvInit as _;
use aes::Aes128;

use crate::crypto::cipher;

#[cfg(doc)]
use crate::crypto;

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

/// A software [`cipher::Engine`].
///
/// The engine is stateless; key and IV are taken per call, matching how
/// the envelope codec re-keys for every transmission.
pub struct Aes128Cbc;

impl cipher::Engine for Aes128Cbc {
    fn encrypt(
        &mut self,
        key: &[u8; 16],
        iv: &[u8; cipher::IV_LEN],
        buf: &mut [u8],
    ) -> Result<(), cipher::Error> {
        check!(buf.len() % cipher::BLOCK_LEN == 0, cipher::Error::NotAligned);

        let mut enc = Encryptor::new(key.into(), iv.into());
        for block in buf.chunks_exact_mut(cipher::BLOCK_LEN) {
            enc.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }

    fn decrypt(
        &mut self,
        key: &[u8; 16],
        iv: &[u8; cipher::IV_LEN],
        buf: &mut [u8],
    ) -> Result<(), cipher::Error> {
        check!(buf.len() % cipher::BLOCK_LEN == 0, cipher::Error::NotAligned);

        let mut dec = Decryptor::new(key.into(), iv.into());
        for block in buf.chunks_exact_mut(cipher::BLOCK_LEN) {
            dec.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::cipher::Engine as _;

    // NIST SP 800-38A, F.2.1 (CBC-AES128.Encrypt), first block.
    const KEY: [u8; 16] = [
        0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15,
        0x88, 0x09, 0xcf, 0x4f, 0x3c,
    ];
    const IV: [u8; 16] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,
        0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ];
    const PLAINTEXT: [u8; 16] = [
        0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e,
        0x11, 0x73, 0x93, 0x17, 0x2a,
    ];
    const CIPHERTEXT: [u8; 16] = [
        0x76, 0x49, 0xab, 0xac, 0x81, 0x19, 0xb2, 0x46, 0xce, 0xe9, 0x8e,
        0x9b, 0x12, 0xe9, 0x19, 0x7d,
    ];

    #[test]
    fn nist_vector() {
        let mut buf = PLAINTEXT;
        Aes128Cbc.encrypt(&KEY, &IV, &mut buf).unwrap();
        assert_eq!(buf, CIPHERTEXT);

        Aes128Cbc.decrypt(&KEY, &IV, &mut buf).unwrap();
        assert_eq!(buf, PLAINTEXT);
    }

    #[test]
    fn multi_block_round_trip() {
        let mut buf = [0u8; 48];
        let orig = buf;

        Aes128Cbc.encrypt(&KEY, &IV, &mut buf).unwrap();
        assert_ne!(buf, orig);
        // CBC chaining: equal plaintext blocks must not produce equal
        // ciphertext blocks.
        assert_ne!(buf[..16], buf[16..32]);

        Aes128Cbc.decrypt(&KEY, &IV, &mut buf).unwrap();
        assert_eq!(buf, orig);
    }

    #[test]
    fn rejects_ragged_buffer() {
        let mut buf = [0u8; 17];
        assert_eq!(
            Aes128Cbc.encrypt(&KEY, &IV, &mut buf),
            Err(cipher::Error::NotAligned)
        );
    }
}
