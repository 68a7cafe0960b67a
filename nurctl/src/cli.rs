// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{ArgAction, ArgGroup, CommandFactory, Parser};
use log::warn;

use nurctl_common::gpio::AntennaLayout;
use nurctl_common::{CancelToken, GpioEdge, GpioType, Mode, Result, ToolError};

use crate::commands::{self, Command, EXIT_BAD_SYNTAX, EXIT_NO_UPDATE, EXIT_OK};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "nurctl")]
#[command(about = "Controller for serial-attached NUR RFID reader modules")]
#[command(disable_help_flag = true)]
#[command(group(
    ArgGroup::new("operation")
        .required(true)
        .args([
            "bootloader", "firmware", "update", "switch", "reset", "config",
            "gpio_config", "gpio_state", "tune", "detect", "help",
        ])
))]
pub struct Cli {
    /// Update boot loader from BINARY_FILE
    #[arg(short = 'b', value_name = "BINARY_FILE")]
    pub bootloader: Option<PathBuf>,

    /// Update firmware from BINARY_FILE
    #[arg(short = 'f', value_name = "BINARY_FILE")]
    pub firmware: Option<PathBuf>,

    /// Check if BINARY_FILE is a firmware update (exit 0xFF if not)
    #[arg(short = 'u', value_name = "BINARY_FILE")]
    pub update: Option<PathBuf>,

    /// Pretend update only (with -b or -f)
    #[arg(short = 'p')]
    pub pretend: bool,

    /// Switch to application (a) or boot loader (b) mode
    #[arg(short = 's', value_name = "a|b", value_parser = ["a", "b"])]
    pub switch: Option<String>,

    /// Reset GPIO config and antenna mask
    #[arg(short = 'r')]
    pub reset: bool,

    /// Reset for four antennas instead of two (with -r)
    #[arg(short = '4')]
    pub four_antennas: bool,

    /// Display module config
    #[arg(short = 'c')]
    pub config: bool,

    /// Set GPIO config: TYPE 0..6, EDGE 0 (falling) or 1 (rising)
    #[arg(
        short = 'g',
        num_args = 4,
        allow_negative_numbers = true,
        value_names = ["IO", "TYPE", "EDGE", "ENABLED"]
    )]
    pub gpio_config: Option<Vec<String>>,

    /// Set GPIO output state
    #[arg(
        short = 'i',
        num_args = 2,
        allow_negative_numbers = true,
        value_names = ["IO", "STATE"]
    )]
    pub gpio_state: Option<Vec<String>>,

    /// Tune antenna 1..4
    #[arg(short = 't', value_name = "ANTENNA")]
    pub tune: Option<String>,

    /// Detect whether antenna 1..4 is connected
    #[arg(short = 'd', value_name = "ANTENNA")]
    pub detect: Option<String>,

    /// Print usage
    #[arg(short = 'h', action = ArgAction::SetTrue)]
    pub help: bool,

    /// Serial port (skips device discovery)
    #[arg(long, value_name = "PATH")]
    pub port: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Turn the parsed flags into the single command to run.
    pub fn resolve(&self) -> Result<Command> {
        if let Some(image) = &self.bootloader {
            return Ok(Command::ProgramBootloader {
                image: image_path(image)?,
                pretend: self.pretend,
            });
        }
        if let Some(image) = &self.firmware {
            return Ok(Command::ProgramFirmware {
                image: image_path(image)?,
                pretend: self.pretend,
            });
        }
        if let Some(image) = &self.update {
            return Ok(Command::CheckUpdate {
                image: image_path(image)?,
            });
        }
        if let Some(target) = &self.switch {
            let target = match target.as_str() {
                "a" => Mode::Application,
                "b" => Mode::Bootloader,
                other => return Err(ToolError::BadSyntax(format!("Unknown mode: {}", other))),
            };
            return Ok(Command::SwitchMode { target });
        }
        if self.reset {
            return Ok(Command::ResetConfig {
                layout: AntennaLayout::from_four_antennas(self.four_antennas),
            });
        }
        if self.config {
            return Ok(Command::ShowConfig);
        }
        if let Some(values) = &self.gpio_config {
            return gpio_config_command(values);
        }
        if let Some(values) = &self.gpio_state {
            return gpio_state_command(values);
        }
        if let Some(antenna) = &self.tune {
            return Ok(Command::Tune {
                antenna: antenna.parse()?,
            });
        }
        if let Some(antenna) = &self.detect {
            return Ok(Command::Detect {
                antenna: antenna.parse()?,
            });
        }
        Err(ToolError::BadSyntax("No operation given".into()))
    }
}

fn gpio_config_command(values: &[String]) -> Result<Command> {
    let [io, gpio_type, edge, enabled] = values else {
        return Err(ToolError::BadSyntax("-g takes four values".into()));
    };
    Ok(Command::SetGpioConfig {
        io: parse_number("GPIO", io)?,
        gpio_type: GpioType::try_from(parse_number::<u8>("GPIO type", gpio_type)?)?,
        edge: GpioEdge::try_from(parse_number::<u8>("GPIO edge", edge)?)?,
        enabled: parse_flag(enabled)?,
    })
}

fn gpio_state_command(values: &[String]) -> Result<Command> {
    let [io, state] = values else {
        return Err(ToolError::BadSyntax("-i takes two values".into()));
    };
    Ok(Command::SetGpioState {
        io: parse_number("GPIO", io)?,
        on: parse_flag(state)?,
    })
}

fn parse_number<T: FromStr>(what: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ToolError::IllegalArgument(format!("Illegal {}: {}", what, value)))
}

/// `true`/`false` in any case, otherwise any non-zero integer is true.
fn parse_flag(value: &str) -> Result<bool> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        parse_number::<i64>("boolean", value).map(|n| n != 0)
    }
}

/// Expand a leading `~` to `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn image_path(raw: &Path) -> Result<PathBuf> {
    let path = expand_home(raw);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ToolError::FileNotFound(path))
    }
}

fn report(err: &ToolError, code: u8) -> u8 {
    eprintln!("PROGRAM EXIT WITH ERROR: {}", err);
    code
}

/// Execute the parsed CLI command and return the process exit code.
pub fn run(cli: Cli, cancel: CancelToken) -> u8 {
    if cli.help {
        println!("{}", Cli::command().render_help());
        return EXIT_BAD_SYNTAX;
    }

    let command = match cli.resolve() {
        Ok(command) => command,
        Err(e) => {
            let code = commands::general_code(&e).unwrap_or(EXIT_BAD_SYNTAX);
            return report(&e, code);
        }
    };

    match commands::execute(&command, cli.port.as_deref(), cancel) {
        Ok(()) => EXIT_OK,
        Err(ToolError::UpdateNotAvailable) => EXIT_NO_UPDATE,
        Err(e) => {
            if let ToolError::MaskRestore { mask, .. } = &e {
                warn!("Antenna mask may need manual restore to {:b}", mask);
            }
            report(&e, commands::exit_code(&command, &e))
        }
    }
}
