// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Mode precondition checks and switching between boot loader and
//! application firmware.

use log::info;

use crate::driver::ReaderDriver;
use crate::error::{Result, ToolError};
use crate::session::Session;
use crate::types::Mode;

/// Fail with [`ToolError::WrongMode`] unless the session's module is in
/// `desired` mode. Never touches the device; releasing the session on
/// failure is up to the caller.
pub fn require<D: ReaderDriver>(session: &Session<D>, desired: Mode) -> Result<()> {
    check(session.mode(), desired)
}

/// Pure form of [`require`].
pub fn check(actual: Mode, desired: Mode) -> Result<()> {
    if actual == desired {
        Ok(())
    } else {
        info!("Module is in wrong mode to perform operation.");
        Err(ToolError::WrongMode {
            expected: desired,
            actual,
        })
    }
}

/// Outcome of a mode switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    AlreadyInMode,
    Switched,
}

/// Bring the module into `target` mode.
///
/// The module restarts after a successful switch; the session must be
/// released afterwards and not used for further calls.
pub fn switch_mode<D: ReaderDriver>(
    session: &mut Session<D>,
    target: Mode,
) -> Result<SwitchOutcome> {
    if session.mode() == target {
        info!("Module already in {} mode", target);
        return Ok(SwitchOutcome::AlreadyInMode);
    }

    match target {
        Mode::Application => {
            info!("Switching to application mode");
            session.driver().exit_bootloader()?;
        }
        Mode::Bootloader => {
            info!("Switching to boot loader mode");
            session.driver().enter_bootloader()?;
        }
        Mode::Unknown => {
            return Err(ToolError::IllegalArgument(
                "Cannot switch to unknown mode".into(),
            ))
        }
    }
    Ok(SwitchOutcome::Switched)
}
