// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line controller for NUR RFID reader modules on /dev/ttyACM*.
//!
//! Usage:
//!   nurctl -f NUR-05WL2_5.11-A.bin       program application firmware
//!   nurctl -u NUR-05WL2_5.11-A.bin       check for a firmware update
//!   nurctl -s b                          switch to boot loader mode
//!   nurctl --port /dev/ttyACM3 -d 2      detect antenna 2

mod cli;
mod commands;
mod transport;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{warn, LevelFilter};

use nurctl_common::CancelToken;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {}",
                buf.timestamp_millis(),
                record.args()
            )
        })
        .init();
}

fn install_interrupt_handler(cancel: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || cancel.cancel()).context("Failed to install Ctrl-C handler")
}

fn main() -> ExitCode {
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(commands::EXIT_BAD_SYNTAX);
        }
    };
    init_logging(args.verbose);

    let cancel = CancelToken::new();
    if let Err(e) = install_interrupt_handler(cancel.clone()) {
        warn!("{:#}", e);
    }

    ExitCode::from(cli::run(args, cancel))
}
