// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error types for reader operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Mode;

/// Failure reported by a reader driver call.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Serial port or link failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Module answered with a non-zero status
    #[error("Module returned error status {0}")]
    Status(u16),

    /// Reply did not match the request
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Firmware image could not be read
    #[error("Image error: {0}")]
    Image(#[from] std::io::Error),

    /// Pin number the driver cannot address
    #[error("Illegal GPIO: {0}")]
    IllegalGpio(i32),

    /// Call issued on a handle that is not connected
    #[error("Not connected")]
    NotConnected,
}

/// Errors surfaced to the command line, one per failure class.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Bad syntax: {0}")]
    BadSyntax(String),

    #[error("Binary file '{}' could not be found.", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to find device. Is NUR module connected?")]
    NoDevice,

    #[error("Module must be in {expected} mode to perform operation (currently in {actual} mode).")]
    WrongMode { expected: Mode, actual: Mode },

    #[error("{0}")]
    IllegalArgument(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Restoring the saved antenna mask failed; the module may be left with
    /// a single antenna enabled.
    #[error("Failed to restore antenna mask {mask:b}: {source}")]
    MaskRestore { mask: u32, source: DriverError },

    #[error("GPIO table has {len} entries, at least {needed} required")]
    GpioTableTooShort { len: usize, needed: usize },

    #[error("Interrupted while waiting for device")]
    Interrupted,

    /// Not a failure: the candidate image matches the running firmware.
    #[error("No firmware update available")]
    UpdateNotAvailable,
}

/// Result type for reader operations
pub type Result<T> = core::result::Result<T, ToolError>;
