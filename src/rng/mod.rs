// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Nonce generation from a seeded PRG and runtime entropy.
//!
//! The device has no hardware RNG, so the 16-byte nonces the protocol
//! needs (CBC IVs and handshake challenges) are produced by
//! [`ChallengeRng`], which mixes three sources:
//!
//! 1. a 48-bit PRG ([`rand48::Rand48`]) seeded from the persistent
//!    [`seeds::SeedStore`], which rotates across reboots;
//! 2. a per-boot *network entropy* block: the first 16 bytes of
//!    `HMAC(PSK, p0 ‖ … ‖ p9)`, where each `p` is a round-trip-time
//!    sample from an [`EntropyProbe`];
//! 3. a per-call *timer entropy* block: the first 16 bytes of
//!    `HMAC(PSK, millis)`, where `millis` is the 32-bit uptime counter.
//!
//! The HMAC serves as key expansion: it stretches 32-bit counters into
//! 128-bit blocks keyed by the pre-shared key, so an eavesdropper without
//! the key cannot reconstruct the mix even if it can guess the counters.
//! Each output word is the XOR of one PRG word with the matching words of
//! both entropy blocks.
//!
//! This construction is the device's observable behavior, not a claim of
//! cryptographic strength; the threat model is a passive eavesdropper or
//! an active replayer without the pre-shared key.

use static_assertions::assert_obj_safe;

use crate::crypto::hmac;
use crate::crypto::hmac::EngineExt as _;
use crate::crypto::nonce;
use crate::crypto::Psk;
use crate::hardware::clock;
use crate::hardware::clock::Clock;
use crate::hardware::flash::Flash;

pub mod rand48;
pub mod seeds;

use rand48::Rand48;
use seeds::SeedStore;

/// The number of probe samples mixed into the per-boot network entropy.
pub const PROBE_ROUNDS: usize = 10;

/// The seed vector used when the seed store cannot be read.
///
/// This is the `drand48` power-on state, i.e. what the PRG would be
/// seeded with on a device whose flash was never provisioned.
const FALLBACK_SEED: [u16; 3] = [0x330e, 0, 0];

/// A source of coarse network-timing entropy.
///
/// The reference integration pings a fixed external host and reports the
/// average round-trip time of a small burst; anything loosely
/// environment-dependent will do.
pub trait EntropyProbe {
    /// Returns one round-trip-time sample, in milliseconds.
    fn round_trip_millis(&mut self) -> u32;
}
assert_obj_safe!(EntropyProbe);

/// An [`EntropyProbe`] for builds without network probing.
///
/// Always reports 43 ms, so the network-entropy block degenerates to a
/// per-key constant.
pub struct DisabledProbe;

impl EntropyProbe for DisabledProbe {
    fn round_trip_millis(&mut self) -> u32 {
        43
    }
}

/// The production nonce source.
///
/// Construction is cheap; the seed store is not touched and the probe is
/// not run until the first nonce is requested. Initializing on first use
/// rather than at boot makes the timer-entropy contribution of the first
/// nonce far less predictable.
pub struct ChallengeRng<'a, F: ?Sized, H, P, C> {
    store: SeedStore<'a, F>,
    hmac: H,
    probe: P,
    clock: &'a C,
    psk: &'a Psk,
    prg: Option<Rand48>,
    network_entropy: [u32; 4],
}

impl<'a, F, H, P, C> ChallengeRng<'a, F, H, P, C>
where
    F: Flash + ?Sized,
    H: hmac::Engine,
    P: EntropyProbe,
    C: Clock,
{
    /// Creates a new `ChallengeRng` over the given collaborators.
    pub fn new(
        flash: &'a mut F,
        hmac: H,
        probe: P,
        clock: &'a C,
        psk: &'a Psk,
    ) -> Self {
        Self {
            store: SeedStore::new(flash),
            hmac,
            probe,
            clock,
            psk,
            prg: None,
            network_entropy: [0; 4],
        }
    }

    /// Rotates and loads the persistent seed, and gathers the per-boot
    /// network entropy.
    fn initialize(&mut self) -> Result<(), nonce::Error> {
        self.store.rotate();
        let index = self.store.read_index();
        let seed = self.store.read_seed(index).unwrap_or(FALLBACK_SEED);
        self.prg = Some(Rand48::from_seed_vector(seed));

        info!("gathering entropy from network...");
        let psk = self.psk;
        let Self { hmac, probe, .. } = self;
        let mut h = hmac
            .new_hmac(psk.as_bytes())
            .map_err(|_| nonce::Error::Unspecified)?;
        for _ in 0..PROBE_ROUNDS {
            let sample = probe.round_trip_millis();
            h.write(&sample.to_le_bytes())
                .map_err(|_| nonce::Error::Unspecified)?;
        }
        let mut digest = [0; hmac::DIGEST_LEN];
        h.finish(&mut digest)
            .map_err(|_| nonce::Error::Unspecified)?;
        self.network_entropy = words_of(&digest);

        Ok(())
    }

    /// Expands the 32-bit uptime counter into a 128-bit block.
    fn timer_entropy(&mut self) -> Result<[u32; 4], nonce::Error> {
        let millis = clock::uptime_millis(self.clock);
        let mut digest = [0; hmac::DIGEST_LEN];
        self.hmac
            .contiguous_hmac(
                self.psk.as_bytes(),
                &millis.to_le_bytes(),
                &mut digest,
            )
            .map_err(|_| nonce::Error::Unspecified)?;
        Ok(words_of(&digest))
    }
}

/// Takes the first 16 bytes of `digest` as four little-endian words.
fn words_of(digest: &[u8; hmac::DIGEST_LEN]) -> [u32; 4] {
    use byteorder::ByteOrder as _;

    let mut words = [0; 4];
    byteorder::LE::read_u32_into(&digest[..16], &mut words);
    words
}

impl<F, H, P, C> nonce::Source for ChallengeRng<'_, F, H, P, C>
where
    F: Flash + ?Sized,
    H: hmac::Engine,
    P: EntropyProbe,
    C: Clock,
{
    fn next_nonce(
        &mut self,
        out: &mut [u8; nonce::NONCE_LEN],
    ) -> Result<(), nonce::Error> {
        if self.prg.is_none() {
            self.initialize()?;
        }

        let timer_entropy = self.timer_entropy()?;
        let prg = match self.prg.as_mut() {
            Some(prg) => prg,
            None => return Err(nonce::Error::Unspecified),
        };

        for i in 0..4 {
            let word =
                prg.next_u32() ^ timer_entropy[i] ^ self.network_entropy[i];
            out[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::nonce::Source as _;
    use crate::crypto::soft::HmacSha1;
    use crate::hardware::clock::fake;

    const PSK: Psk = Psk::new([
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a,
        0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
    ]);

    const IMAGE_LEN: usize = seeds::CURRENT_SEED_INDEX_ADDRESS as usize + 2;

    /// A flash image whose current seed is `seed`, at index 3.
    fn image_with_seed(seed: [u16; 3]) -> Vec<u8> {
        let mut image = vec![0u8; IMAGE_LEN];
        let at = seeds::CURRENT_SEED_INDEX_ADDRESS as usize;
        image[at..at + 2].copy_from_slice(&3u16.to_le_bytes());

        let at = seeds::EXTERNAL_FLASH_START as usize
            + seeds::SEED_LEN as usize * 3;
        image[at..at + 2].copy_from_slice(&seed[0].to_le_bytes());
        image[at + 2..at + 4].copy_from_slice(&seed[1].to_le_bytes());
        image[at + 4..at + 6].copy_from_slice(&seed[2].to_le_bytes());
        image
    }

    // Seed-index bookkeeping differs when rotation is on; the fixture
    // below pins the seed at the stored index.
    #[cfg(not(feature = "rotate-seed"))]
    #[test]
    fn known_answer() {
        // Entropy blocks computed independently: the first 16 bytes of
        // HMAC(PSK, 1000u32 le) and of HMAC(PSK, ten rounds of 43u32 le).
        const TIMER_ENTROPY: [u8; 16] = [
            0x56, 0x31, 0x06, 0xfa, 0x73, 0x3f, 0x65, 0x1c, 0x21, 0x2f,
            0x41, 0xfe, 0xbb, 0x69, 0x2d, 0xb5,
        ];
        const NETWORK_ENTROPY: [u8; 16] = [
            0x52, 0x23, 0x66, 0x41, 0xb0, 0x54, 0xb4, 0x05, 0xb8, 0xd5,
            0xd4, 0xd7, 0x09, 0x7a, 0xb6, 0x31,
        ];
        // seed48([0x1234, 0x5678, 0x9abc]) high words.
        const PRG_WORDS: [u32; 4] =
            [0x495e916a, 0xef341fa3, 0x89067f2b, 0xe2a60d6f];

        let mut image = image_with_seed([0x1234, 0x5678, 0x9abc]);
        let clock = fake::Clock::new();
        clock.set(1000);
        let mut rng = ChallengeRng::new(
            &mut image[..],
            HmacSha1::new(),
            DisabledProbe,
            &clock,
            &PSK,
        );

        let mut nonce = [0; 16];
        rng.next_nonce(&mut nonce).unwrap();

        use byteorder::ByteOrder as _;
        let mut timer = [0u32; 4];
        byteorder::LE::read_u32_into(&TIMER_ENTROPY, &mut timer);
        let mut network = [0u32; 4];
        byteorder::LE::read_u32_into(&NETWORK_ENTROPY, &mut network);

        for i in 0..4 {
            let got =
                byteorder::LE::read_u32(&nonce[4 * i..4 * i + 4]);
            assert_eq!(got, PRG_WORDS[i] ^ timer[i] ^ network[i]);
        }
    }

    #[test]
    fn consecutive_nonces_differ() {
        let mut image = image_with_seed([0x1234, 0x5678, 0x9abc]);
        let clock = fake::Clock::new();
        let mut rng = ChallengeRng::new(
            &mut image[..],
            HmacSha1::new(),
            DisabledProbe,
            &clock,
            &PSK,
        );

        // Even with a frozen clock, the PRG keeps the outputs distinct.
        let mut a = [0; 16];
        let mut b = [0; 16];
        rng.next_nonce(&mut a).unwrap();
        rng.next_nonce(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unreadable_store_falls_back() {
        use crate::hardware::flash::{
            Flash, FlashPtr, FlashSlice, OutOfBounds,
        };

        struct BrokenFlash;
        impl Flash for BrokenFlash {
            type Error = OutOfBounds;
            fn size(&self) -> Result<u32, OutOfBounds> {
                Err(OutOfBounds)
            }
            fn read(
                &self,
                _: FlashSlice,
                _: &mut [u8],
            ) -> Result<(), OutOfBounds> {
                Err(OutOfBounds)
            }
            fn erase_sector(
                &mut self,
                _: FlashPtr,
            ) -> Result<(), OutOfBounds> {
                Err(OutOfBounds)
            }
            fn write(
                &mut self,
                _: FlashPtr,
                _: &[u8],
            ) -> Result<(), OutOfBounds> {
                Err(OutOfBounds)
            }
        }

        let mut flash = BrokenFlash;
        let clock = fake::Clock::new();
        let mut rng = ChallengeRng::new(
            &mut flash,
            HmacSha1::new(),
            DisabledProbe,
            &clock,
            &PSK,
        );

        let mut nonce = [0; 16];
        rng.next_nonce(&mut nonce).unwrap();
        assert_ne!(nonce, [0; 16]);
    }
}
