// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations and exit-code mapping.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use nurctl_common::antenna;
use nurctl_common::firmware;
use nurctl_common::gpio::{self, AntennaLayout};
use nurctl_common::inspect;
use nurctl_common::mode;
use nurctl_common::session::{self, Session};
use nurctl_common::{
    AntennaId, CancelToken, ConnectionManager, DottedProgress, EventSink, GpioEdge, GpioType,
    Mode, ReaderDriver, Result, RetryPolicy, ToolError, DEVICE_COUNT, DEVICE_PREFIX,
};

use crate::transport::SerialDriver;

pub const EXIT_OK: u8 = 0x00;
pub const EXIT_BAD_SYNTAX: u8 = 0x01;
pub const EXIT_FILE_NOT_FOUND: u8 = 0x02;
pub const EXIT_NO_DEVICE: u8 = 0x04;
pub const EXIT_SWITCH_FAILED: u8 = 0x08;
pub const EXIT_FIRMWARE_FAILED: u8 = 0x10;
pub const EXIT_BOOTLOADER_FAILED: u8 = 0x20;
pub const EXIT_ILLEGAL_ARGUMENT: u8 = 0x30;
pub const EXIT_ANTENNA_FAILED: u8 = 0x40;
pub const EXIT_CONFIG_FAILED: u8 = 0x50;
pub const EXIT_GPIO_FAILED: u8 = 0x60;
pub const EXIT_NO_UPDATE: u8 = 0xFF;

/// One resolved operation per invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ProgramBootloader { image: PathBuf, pretend: bool },
    ProgramFirmware { image: PathBuf, pretend: bool },
    CheckUpdate { image: PathBuf },
    SwitchMode { target: Mode },
    ResetConfig { layout: AntennaLayout },
    ShowConfig,
    SetGpioConfig {
        io: i32,
        gpio_type: GpioType,
        edge: GpioEdge,
        enabled: bool,
    },
    SetGpioState { io: i32, on: bool },
    Tune { antenna: AntennaId },
    Detect { antenna: AntennaId },
}

impl Command {
    /// Exit code reported when this command fails for a non-general reason.
    pub fn failure_code(&self) -> u8 {
        match self {
            Command::ProgramBootloader { .. } => EXIT_BOOTLOADER_FAILED,
            Command::ProgramFirmware { .. } | Command::CheckUpdate { .. } => EXIT_FIRMWARE_FAILED,
            Command::SwitchMode { .. } => EXIT_SWITCH_FAILED,
            Command::ResetConfig { .. } | Command::Tune { .. } | Command::Detect { .. } => {
                EXIT_ANTENNA_FAILED
            }
            Command::ShowConfig => EXIT_CONFIG_FAILED,
            Command::SetGpioConfig { .. } | Command::SetGpioState { .. } => EXIT_GPIO_FAILED,
        }
    }
}

/// Exit codes shared by every command.
pub fn general_code(err: &ToolError) -> Option<u8> {
    match err {
        ToolError::BadSyntax(_) => Some(EXIT_BAD_SYNTAX),
        ToolError::FileNotFound(_) => Some(EXIT_FILE_NOT_FOUND),
        ToolError::NoDevice => Some(EXIT_NO_DEVICE),
        ToolError::IllegalArgument(_) => Some(EXIT_ILLEGAL_ARGUMENT),
        ToolError::UpdateNotAvailable => Some(EXIT_NO_UPDATE),
        _ => None,
    }
}

pub fn exit_code(command: &Command, err: &ToolError) -> u8 {
    general_code(err).unwrap_or_else(|| command.failure_code())
}

/// Find the device, run `command` in a session and release it.
pub fn execute(command: &Command, port: Option<&Path>, cancel: CancelToken) -> Result<()> {
    let path = match port {
        Some(path) => path.to_path_buf(),
        None => session::wait_for_device(
            DEVICE_PREFIX,
            DEVICE_COUNT,
            RetryPolicy::default(),
            &cancel,
        )?,
    };
    info!("Using device {}", path.display());

    let sink: Arc<dyn EventSink> = Arc::new(DottedProgress::new(io::stdout()));
    let mut manager = ConnectionManager::new(SerialDriver::open, sink).with_cancel_token(cancel);

    manager.with_session(&path, |session| run(command, session))
}

/// Dispatch `command` on an open session.
pub fn run<D: ReaderDriver>(command: &Command, session: &mut Session<D>) -> Result<()> {
    match command {
        Command::ProgramBootloader { image, pretend } => {
            firmware::program_bootloader(session, image, *pretend)
        }
        Command::ProgramFirmware { image, pretend } => {
            firmware::program_application(session, image, *pretend)
        }
        Command::CheckUpdate { image } => {
            if firmware::check_update_available(session, image)? {
                info!("Firmware update available");
                Ok(())
            } else {
                info!("No firmware update available");
                Err(ToolError::UpdateNotAvailable)
            }
        }
        Command::SwitchMode { target } => mode::switch_mode(session, *target).map(|_| ()),
        Command::ResetConfig { layout } => gpio::reset_config(session, *layout),
        Command::ShowConfig => inspect::show_config(session),
        Command::SetGpioConfig {
            io,
            gpio_type,
            edge,
            enabled,
        } => gpio::set_config(session, *io, *gpio_type, *edge, *enabled).map(|_| ()),
        Command::SetGpioState { io, on } => gpio::set_state(session, *io, *on),
        Command::Tune { antenna } => antenna::tune(session, *antenna).map(|_| ()),
        Command::Detect { antenna } => antenna::detect(session, *antenna).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nurctl_common::DriverError;

    fn tune_one() -> Command {
        Command::Tune {
            antenna: AntennaId::new(1).unwrap(),
        }
    }

    #[test]
    fn test_driver_failure_maps_to_command_family() {
        let err = ToolError::Driver(DriverError::Status(0x20));
        let image = PathBuf::from("fw.bin");

        let cases = [
            (
                Command::ProgramBootloader {
                    image: image.clone(),
                    pretend: false,
                },
                0x20,
            ),
            (
                Command::ProgramFirmware {
                    image: image.clone(),
                    pretend: true,
                },
                0x10,
            ),
            (Command::CheckUpdate { image }, 0x10),
            (
                Command::SwitchMode {
                    target: Mode::Bootloader,
                },
                0x08,
            ),
            (
                Command::ResetConfig {
                    layout: AntennaLayout::Two,
                },
                0x40,
            ),
            (Command::ShowConfig, 0x50),
            (Command::SetGpioState { io: 1, on: true }, 0x60),
            (tune_one(), 0x40),
        ];

        for (command, expected) in cases {
            assert_eq!(exit_code(&command, &err), expected, "{:?}", command);
        }
    }

    #[test]
    fn test_general_codes_win_over_command_family() {
        let command = tune_one();
        assert_eq!(exit_code(&command, &ToolError::NoDevice), 0x04);
        assert_eq!(
            exit_code(&command, &ToolError::IllegalArgument("x".into())),
            0x30
        );
        assert_eq!(
            exit_code(&command, &ToolError::FileNotFound(PathBuf::from("x"))),
            0x02
        );
        assert_eq!(exit_code(&command, &ToolError::BadSyntax("x".into())), 0x01);
    }

    #[test]
    fn test_illegal_gpio_state_is_gpio_failure() {
        let command = Command::SetGpioState { io: -1, on: true };
        let err = ToolError::Driver(DriverError::IllegalGpio(-1));
        assert_eq!(exit_code(&command, &err), 0x60);
    }

    #[test]
    fn test_no_update_has_its_own_code() {
        let command = Command::CheckUpdate {
            image: PathBuf::from("fw.bin"),
        };
        assert_eq!(exit_code(&command, &ToolError::UpdateNotAvailable), 0xFF);
    }

    #[test]
    fn test_wrong_mode_and_restore_failure_use_command_family() {
        let command = Command::Detect {
            antenna: AntennaId::new(2).unwrap(),
        };
        let wrong_mode = ToolError::WrongMode {
            expected: Mode::Application,
            actual: Mode::Bootloader,
        };
        let restore = ToolError::MaskRestore {
            mask: 0x3,
            source: DriverError::NotConnected,
        };
        assert_eq!(exit_code(&command, &wrong_mode), 0x40);
        assert_eq!(exit_code(&command, &restore), 0x40);
        assert_eq!(exit_code(&command, &ToolError::Interrupted), 0x40);
    }
}
