// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Pluggable hardware functionality.
//!
//! This module provides traits for plugging in OS or board-support calls
//! to the hardware the core depends on: external flash (for the seed
//! store) and a millisecond uptime clock (for conversation deadlines and
//! timer entropy). `gatehouse` never touches hardware except through these
//! traits.

pub mod clock;
pub mod flash;

pub use clock::Clock;
pub use flash::Flash;
