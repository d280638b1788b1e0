// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `gatehouse-tool` is a simple command-line tool for provisioning
//! `gatehouse` devices.

#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]

use structopt::StructOpt as _;

mod seed_file;

/// A command-line tool for provisioning gatehouse devices.
#[allow(missing_docs)]
#[derive(structopt::StructOpt)]
#[structopt(author)]
enum CliCommand {
    #[structopt(flatten)]
    SeedFile(seed_file::SeedFile),
}

fn main() {
    match CliCommand::from_args() {
        CliCommand::SeedFile(cmd) => cmd.run(),
    }
}
