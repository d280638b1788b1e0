// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Generation of the seed file burned into a device's external flash.
//!
//! The file image is exactly what the seed-store region of flash expects:
//! `0x10000` six-byte PRG seed records (the last one is an unused
//! trailing slot), followed by the little-endian `current_seed_index`,
//! initialized to 1.

use std::fs::File;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::PathBuf;

use byteorder::WriteBytesExt as _;
use byteorder::LE;

use gatehouse::rng::seeds;

/// The number of six-byte records in the file: every addressable seed
/// plus the unused trailing slot.
const RECORD_COUNT: u32 = seeds::NUMBER_OF_SEEDS as u32 + 1;

/// Seed-file commands.
#[derive(structopt::StructOpt)]
pub enum SeedFile {
    /// Generates a fresh seed file for burning into external flash.
    SeedFile {
        /// Path to write the image to.
        #[structopt(short, long, default_value = "seeds.bin")]
        output: PathBuf,
    },
}

impl SeedFile {
    /// Runs the command.
    pub fn run(self) {
        let Self::SeedFile { output } = self;

        let file = File::create(&output).expect("failed to create output");
        let mut file = BufWriter::new(file);
        write_image(&mut rand::thread_rng(), &mut file)
            .expect("failed to write image");
        file.flush().expect("failed to flush output");

        println!("wrote {}", output.display());
    }
}

/// Writes a complete seed-file image to `w`.
///
/// Each record takes two draws from the host PRG: four bytes, then two,
/// mirroring how the original table was produced from consecutive
/// `rand()` outputs.
fn write_image(
    rng: &mut impl rand::RngCore,
    w: &mut impl std::io::Write,
) -> std::io::Result<()> {
    for _ in 0..RECORD_COUNT {
        w.write_u32::<LE>(rng.next_u32())?;
        w.write_u16::<LE>(rng.next_u32() as u16)?;
    }

    // The stored index starts at 1; record 0 is never used on a
    // freshly-provisioned device.
    w.write_u16::<LE>(1)?;
    Ok(())
}
