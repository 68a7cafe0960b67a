// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Read-only dump of the module configuration.

use log::info;

use crate::driver::ReaderDriver;
use crate::error::Result;
use crate::gpio::log_table;
use crate::mode;
use crate::session::Session;
use crate::types::{Describe, Mode};

/// Log every field of `value` as `name: value`.
pub fn log_fields(value: &dyn Describe) {
    for field in value.fields() {
        info!("{}: {}", field.name, field.value);
    }
}

/// Log GPIO table, antenna mask, setup, IR config, reader info,
/// capabilities and region info. Requires application mode.
pub fn show_config<D: ReaderDriver>(session: &mut Session<D>) -> Result<()> {
    mode::require(session, Mode::Application)?;
    let driver = session.driver();

    info!("");
    info!("Current GPIO config:");
    log_table(&driver.gpio_config()?);

    info!("");
    let mask = driver.antenna_mask()?;
    info!("Current antenna mask: {}", mask.bits());

    info!("");
    info!("Current module setup:");
    log_fields(&driver.module_setup()?);

    info!("");
    info!("Current IR config:");
    log_fields(&driver.ir_config()?);

    info!("");
    info!("Current reader info:");
    log_fields(&driver.reader_info()?);

    info!("");
    info!("Current device capabilities:");
    log_fields(&driver.device_caps()?);

    info!("");
    info!("Current region info:");
    log_fields(&driver.region_info()?);

    Ok(())
}
