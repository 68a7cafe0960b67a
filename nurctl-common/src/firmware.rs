// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware and boot loader programming.

use std::path::Path;

use log::info;

use crate::driver::ReaderDriver;
use crate::error::Result;
use crate::mode;
use crate::session::Session;
use crate::types::{Mode, MODULE_TYPE};

/// Which image a programming request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Application,
    Bootloader,
}

/// Program an application firmware image. Requires boot loader mode.
///
/// With `pretend` only the intention is logged. Progress is reported
/// through the session's event sink while the driver call blocks.
pub fn program_application<D: ReaderDriver>(
    session: &mut Session<D>,
    image: &Path,
    pretend: bool,
) -> Result<()> {
    program(session, ImageKind::Application, image, pretend)
}

/// Program a boot loader image. Also requires boot loader mode.
pub fn program_bootloader<D: ReaderDriver>(
    session: &mut Session<D>,
    image: &Path,
    pretend: bool,
) -> Result<()> {
    program(session, ImageKind::Bootloader, image, pretend)
}

fn program<D: ReaderDriver>(
    session: &mut Session<D>,
    kind: ImageKind,
    image: &Path,
    pretend: bool,
) -> Result<()> {
    mode::require(session, Mode::Bootloader)?;

    let what = match kind {
        ImageKind::Application => "firmware",
        ImageKind::Bootloader => "boot loader",
    };

    if pretend {
        info!("Pretending {} update", what);
        return Ok(());
    }

    info!("Installing {} update", what);
    let driver = session.driver();
    match kind {
        ImageKind::Application => driver.program_application(image)?,
        ImageKind::Bootloader => driver.program_bootloader(image)?,
    }
    Ok(())
}

/// Whether `image` carries a firmware version different from the one
/// running on the module. Requires application mode.
///
/// The comparison is plain byte equality of the version strings; a
/// differently formatted or older version also counts as an update.
pub fn check_update_available<D: ReaderDriver>(
    session: &mut Session<D>,
    image: &Path,
) -> Result<bool> {
    mode::require(session, Mode::Application)?;

    let driver = session.driver();
    let new_version = driver.image_version(image, MODULE_TYPE)?;
    let current_version = driver.reader_info()?.sw_version;

    info!("New firmware version:     {}", new_version);
    info!("File:                     {}", image.display());

    Ok(is_update(&current_version, &new_version))
}

/// Version strings are compared verbatim, without normalisation.
pub fn is_update(current: &str, candidate: &str) -> bool {
    current.as_bytes() != candidate.as_bytes()
}
