// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! External flash abstraction.
//!
//! This module provides the [`Flash`] (and related) traits, which
//! represent *abstract flash devices*. An abstract flash device is a
//! region of memory that can be read, erased, and rewritten. Such a
//! "device" can range from a simple Rust slice to an external SPI flash
//! part.
//!
//! [`Flash`]: trait.Flash.html

use zerocopy::AsBytes;
use zerocopy::FromBytes;

/// The erase granule of the device, in bytes.
///
/// Writes to an already-written region must be preceded by an erase of
/// the sector containing it; the seed-index sector is placed on a
/// boundary for exactly this reason.
pub const SECTOR_LEN: usize = 4096;

/// Provides access to a flash-like storage device.
///
/// This trait provides abstract operations on a device, as if it were a
/// block of random-access memory. It is the implementation's
/// responsibility to implement these operations efficiently with respect
/// to the underlying device.
///
/// The `Flash` trait comes implemented for `[u8]`, which is useful for
/// testing.
pub trait Flash {
    /// The error type returned by transactions with this `Flash`.
    type Error: Sized;

    /// Gets the size, in bytes, of this device.
    fn size(&self) -> Result<u32, Self::Error>;

    /// Attempts to read `slice` into `out`.
    ///
    /// `out` must be exactly `slice.len` bytes long.
    fn read(
        &self,
        slice: FlashSlice,
        out: &mut [u8],
    ) -> Result<(), Self::Error>;

    /// Erases the sector containing `ptr`.
    ///
    /// Every byte of the sector reads as `0xff` afterwards.
    fn erase_sector(&mut self, ptr: FlashPtr) -> Result<(), Self::Error>;

    /// Writes `data` starting at `ptr`.
    ///
    /// The region is expected to have been erased beforehand.
    fn write(&mut self, ptr: FlashPtr, data: &[u8])
        -> Result<(), Self::Error>;
}

/// An abstract pointer into a [`Flash`] type.
///
/// A `FlashPtr` needs to be used in conjunction with a [`Flash`]
/// implementation to be read from or written to.
///
/// [`Flash`]: trait.Flash.html
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsBytes, FromBytes)]
#[repr(transparent)]
pub struct FlashPtr {
    /// The abstract address of this pointer.
    pub address: u32,
}

impl FlashPtr {
    /// Convenience method for creating a `FlashPtr` without having to use
    /// a struct literal.
    pub const fn new(address: u32) -> Self {
        Self { address }
    }
}

/// An abstract slice into a [`Flash`] type.
///
/// Much like a [`FlashPtr`], a `FlashSlice` needs to be interpreted with
/// respect to a [`Flash`] implementation.
///
/// [`Flash`]: trait.Flash.html
/// [`FlashPtr`]: struct.FlashPtr.html
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsBytes, FromBytes)]
#[repr(C)]
pub struct FlashSlice {
    /// The base pointer for this slice.
    pub ptr: FlashPtr,
    /// The length of the slice, in bytes.
    pub len: u32,
}

impl FlashSlice {
    /// Convenience method for creating a `FlashSlice` without having to
    /// use a struct literal.
    pub const fn new(ptr: u32, len: u32) -> Self {
        Self {
            ptr: FlashPtr::new(ptr),
            len,
        }
    }
}

/// An unspecified out-of-bounds error.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct OutOfBounds;

impl Flash for [u8] {
    type Error = OutOfBounds;

    fn size(&self) -> Result<u32, Self::Error> {
        Ok(self.len() as u32)
    }

    fn read(
        &self,
        slice: FlashSlice,
        out: &mut [u8],
    ) -> Result<(), Self::Error> {
        let start = slice.ptr.address as usize;
        let end = start.checked_add(slice.len as usize).ok_or(OutOfBounds)?;
        if end > self.len() || out.len() != slice.len as usize {
            return Err(OutOfBounds);
        }
        out.copy_from_slice(&self[start..end]);
        Ok(())
    }

    fn erase_sector(&mut self, ptr: FlashPtr) -> Result<(), Self::Error> {
        let start = ptr.address as usize / SECTOR_LEN * SECTOR_LEN;
        if start >= self.len() {
            return Err(OutOfBounds);
        }
        let end = usize::min(start + SECTOR_LEN, self.len());
        for byte in &mut self[start..end] {
            *byte = 0xff;
        }
        Ok(())
    }

    fn write(
        &mut self,
        ptr: FlashPtr,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        let start = ptr.address as usize;
        let end = start.checked_add(data.len()).ok_or(OutOfBounds)?;
        if end > self.len() {
            return Err(OutOfBounds);
        }
        self[start..end].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slice_read_write() {
        let mut mem = [0u8; 2 * SECTOR_LEN];
        let flash: &mut [u8] = &mut mem;

        flash.write(FlashPtr::new(10), b"abcdef").unwrap();
        let mut out = [0u8; 6];
        flash.read(FlashSlice::new(10, 6), &mut out).unwrap();
        assert_eq!(&out, b"abcdef");

        assert_eq!(flash.size().unwrap(), 2 * SECTOR_LEN as u32);
    }

    #[test]
    fn erase_clears_whole_sector() {
        let mut mem = [0u8; 2 * SECTOR_LEN];
        let flash: &mut [u8] = &mut mem;

        flash.write(FlashPtr::new(0), b"xy").unwrap();
        flash
            .write(FlashPtr::new(SECTOR_LEN as u32), b"zw")
            .unwrap();
        flash.erase_sector(FlashPtr::new(17)).unwrap();

        let mut out = [0u8; 2];
        flash.read(FlashSlice::new(0, 2), &mut out).unwrap();
        assert_eq!(out, [0xff, 0xff]);
        // The neighboring sector is untouched.
        flash
            .read(FlashSlice::new(SECTOR_LEN as u32, 2), &mut out)
            .unwrap();
        assert_eq!(&out, b"zw");
    }

    #[test]
    fn out_of_bounds() {
        let mut mem = [0u8; 64];
        let flash: &mut [u8] = &mut mem;

        let mut out = [0u8; 8];
        assert_eq!(
            flash.read(FlashSlice::new(60, 8), &mut out),
            Err(OutOfBounds)
        );
        assert_eq!(
            flash.write(FlashPtr::new(60), &[0; 8]),
            Err(OutOfBounds)
        );
    }
}
