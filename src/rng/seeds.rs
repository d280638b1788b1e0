// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The persistent seed store.
//!
//! External flash holds a table of 0xFFFF pre-computed 48-bit PRG seeds,
//! generated offline, followed by the index of the seed to use for the
//! current boot:
//!
//! ```text
//! offset                        size       content
//! EXTERNAL_FLASH_START          6 * 0xFFFF seed table (little-endian)
//!                               6          one unused trailing slot
//! CURRENT_SEED_INDEX_ADDRESS    2          current_seed_index (LE u16)
//! ```
//!
//! The index advances once per boot when the `rotate-seed` feature is
//! enabled, so no two boots start the PRG from the same place. Rotation
//! costs a sector erase per boot; integrations that care more about flash
//! endurance than about seed reuse build without the feature, and
//! `rotate()` degrades to a read.
//!
//! Flash trouble never propagates out of this module: the index falls
//! back to whatever was cached (or zero), and the PRG soldiers on. A
//! predictable seed is a lesser evil than a door controller that cannot
//! boot.

use crate::hardware::flash::Flash;
use crate::hardware::flash::FlashSlice;

/// The flash address where the seed table begins.
pub const EXTERNAL_FLASH_START: u32 = 0x8_0000;

/// The number of usable seeds in the table.
pub const NUMBER_OF_SEEDS: u16 = 0xffff;

/// The size, in bytes, of one 48-bit seed record.
pub const SEED_LEN: u32 = 6;

/// The flash address of the persisted `current_seed_index`.
///
/// Located after the table and its one unused trailing slot, on a sector
/// boundary so it can be erased without disturbing the seeds.
pub const CURRENT_SEED_INDEX_ADDRESS: u32 =
    EXTERNAL_FLASH_START + SEED_LEN * (NUMBER_OF_SEEDS as u32 + 1);

/// The persistent, rotating seed store.
pub struct SeedStore<'f, F: ?Sized> {
    flash: &'f mut F,
    cached_index: Option<u16>,
}

impl<'f, F: Flash + ?Sized> SeedStore<'f, F> {
    /// Creates a store over `flash`.
    ///
    /// Nothing is read until the first [`SeedStore::read_index()`].
    pub fn new(flash: &'f mut F) -> Self {
        Self {
            flash,
            cached_index: None,
        }
    }

    /// Returns the current seed index.
    ///
    /// The first call reads flash; every later call answers from cache.
    /// On a read failure the index falls back to zero, which is then
    /// cached like any other value.
    pub fn read_index(&mut self) -> u16 {
        if let Some(index) = self.cached_index {
            return index;
        }

        let mut bytes = [0; 2];
        let index = match self.flash.read(
            FlashSlice::new(CURRENT_SEED_INDEX_ADDRESS, 2),
            &mut bytes,
        ) {
            Ok(()) => u16::from_le_bytes(bytes),
            Err(_) => {
                error!("seed index read failed; falling back to 0");
                0
            }
        };

        info!("seed index: {}", index);
        self.cached_index = Some(index);
        index
    }

    /// Advances the persisted index by one, modulo [`NUMBER_OF_SEEDS`].
    ///
    /// With the `rotate-seed` feature disabled this only populates the
    /// cache. Write failures keep the previously-cached index and surface
    /// nothing.
    pub fn rotate(&mut self) {
        let index = self.read_index();

        #[cfg(feature = "rotate-seed")]
        {
            let next = index.wrapping_add(1) % NUMBER_OF_SEEDS;
            info!("persisting new seed index: {}", next);

            let erased = self
                .flash
                .erase_sector(FlashPtr::new(CURRENT_SEED_INDEX_ADDRESS));
            let written = erased.and_then(|()| {
                self.flash.write(
                    FlashPtr::new(CURRENT_SEED_INDEX_ADDRESS),
                    &next.to_le_bytes(),
                )
            });

            match written {
                Ok(()) => self.cached_index = Some(next),
                Err(_) => {
                    error!("seed index write failed; keeping {}", index)
                }
            }
        }

        #[cfg(not(feature = "rotate-seed"))]
        let _ = index;
    }

    /// Reads the 48-bit seed at `index`, as a `seed48()`-style vector.
    ///
    /// Returns `None` if the read fails; the caller picks its own
    /// fallback.
    pub fn read_seed(&mut self, index: u16) -> Option<[u16; 3]> {
        let mut bytes = [0; SEED_LEN as usize];
        let address = EXTERNAL_FLASH_START + SEED_LEN * index as u32;
        match self
            .flash
            .read(FlashSlice::new(address, SEED_LEN), &mut bytes)
        {
            Ok(()) => Some([
                u16::from_le_bytes([bytes[0], bytes[1]]),
                u16::from_le_bytes([bytes[2], bytes[3]]),
                u16::from_le_bytes([bytes[4], bytes[5]]),
            ]),
            Err(_) => {
                error!("seed read at {} failed", address);
                None
            }
        }
    }
}
