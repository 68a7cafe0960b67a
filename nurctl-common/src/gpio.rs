// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! GPIO table edits and the factory configuration templates.
//!
//! None of these writes are transactional: a failure between writing the
//! table, setting the antenna mask and persisting leaves the module with
//! whatever was written so far.

use log::info;

use crate::driver::ReaderDriver;
use crate::error::{DriverError, Result, ToolError};
use crate::mode;
use crate::session::Session;
use crate::types::{AntennaMask, GpioConfigEntry, GpioEdge, GpioType, Mode, StoreScope};

/// Whether a GPIO config request was written to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioUpdate {
    Applied,
    /// The pin index was outside the table; nothing was written.
    OutOfRange,
}

/// Log a GPIO table, one line per pin.
pub fn log_table(entries: &[GpioConfigEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        info!(
            "gpio[{}]=[type={:?}, edge={:?}, available={}, action={:?}, enabled={}]",
            index, entry.gpio_type, entry.edge, entry.available, entry.action, entry.enabled
        );
    }
}

/// Reconfigure pin `io` and persist the whole setup.
pub fn set_config<D: ReaderDriver>(
    session: &mut Session<D>,
    io: i32,
    gpio_type: GpioType,
    edge: GpioEdge,
    enabled: bool,
) -> Result<GpioUpdate> {
    mode::require(session, Mode::Application)?;
    let driver = session.driver();

    info!("Acquiring current GPIO config");
    let mut table = driver.gpio_config()?;
    info!("Current GPIO config:");
    log_table(&table);

    let entry = usize::try_from(io).ok().and_then(|index| table.get_mut(index));
    let Some(entry) = entry else {
        info!("Illegal GPIO cannot be set: {}", io);
        return Ok(GpioUpdate::OutOfRange);
    };
    entry.configure(gpio_type, edge, enabled);

    info!("Setting new GPIO config:");
    driver.set_gpio_config(&table)?;
    log_table(&table);

    info!("Storing config");
    driver.store_setup(StoreScope::All)?;
    Ok(GpioUpdate::Applied)
}

/// Drive output pin `io` on or off.
pub fn set_state<D: ReaderDriver>(session: &mut Session<D>, io: i32, on: bool) -> Result<()> {
    mode::require(session, Mode::Application)?;
    let io = u8::try_from(io).map_err(|_| DriverError::IllegalGpio(io))?;
    let driver = session.driver();

    info!("Acquiring current GPIO state");
    let status = driver.gpio_status(io)?;
    info!("Current GPIO {} state:", io);
    crate::inspect::log_fields(&status);

    info!("Changing GPIO {} state to {}", io, if on { "on" } else { "off" });
    driver.set_gpio_state(io, on)?;
    Ok(())
}

// --- Factory templates ---

/// Board layout the configuration is reset for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntennaLayout {
    Two,
    Four,
}

/// Leading GPIO rows each template writes.
pub const TEMPLATE_LEN: usize = 5;

/// One template row: (type, edge). Every row is enabled.
type TemplateRow = (GpioType, GpioEdge);

const TWO_ANTENNA_GPIO: [TemplateRow; TEMPLATE_LEN] = [
    (GpioType::AntCtl1, GpioEdge::Falling),
    (GpioType::RfidOn, GpioEdge::Rising),
    (GpioType::RfidOn, GpioEdge::Rising),
    (GpioType::Input, GpioEdge::Falling),
    (GpioType::Input, GpioEdge::Falling),
];

const FOUR_ANTENNA_GPIO: [TemplateRow; TEMPLATE_LEN] = [
    (GpioType::AntCtl2, GpioEdge::Falling),
    (GpioType::AntCtl1, GpioEdge::Falling),
    (GpioType::RfidOn, GpioEdge::Rising),
    (GpioType::RfidOn, GpioEdge::Rising),
    (GpioType::Input, GpioEdge::Falling),
];

const TWO_ANTENNA_MASK: AntennaMask = AntennaMask::ANTENNA_1.union(AntennaMask::ANTENNA_2);

const FOUR_ANTENNA_MASK: AntennaMask = AntennaMask::ANTENNA_1
    .union(AntennaMask::ANTENNA_2)
    .union(AntennaMask::ANTENNA_3)
    .union(AntennaMask::ANTENNA_4);

impl AntennaLayout {
    pub fn from_four_antennas(four_antennas: bool) -> Self {
        if four_antennas {
            AntennaLayout::Four
        } else {
            AntennaLayout::Two
        }
    }

    fn gpio_template(self) -> &'static [TemplateRow; TEMPLATE_LEN] {
        match self {
            AntennaLayout::Two => &TWO_ANTENNA_GPIO,
            AntennaLayout::Four => &FOUR_ANTENNA_GPIO,
        }
    }

    pub fn antenna_mask(self) -> AntennaMask {
        match self {
            AntennaLayout::Two => TWO_ANTENNA_MASK,
            AntennaLayout::Four => FOUR_ANTENNA_MASK,
        }
    }

    fn antenna_count(self) -> u8 {
        match self {
            AntennaLayout::Two => 2,
            AntennaLayout::Four => 4,
        }
    }

    /// Apply the template to `table`, leaving rows past the template alone.
    pub fn apply(self, table: &mut [GpioConfigEntry]) -> Result<()> {
        if table.len() < TEMPLATE_LEN {
            return Err(ToolError::GpioTableTooShort {
                len: table.len(),
                needed: TEMPLATE_LEN,
            });
        }
        for (entry, &(gpio_type, edge)) in table.iter_mut().zip(self.gpio_template()) {
            entry.configure(gpio_type, edge, true);
        }
        Ok(())
    }
}

/// Reset GPIOs and antenna mask to the template for `layout`, then persist.
pub fn reset_config<D: ReaderDriver>(
    session: &mut Session<D>,
    layout: AntennaLayout,
) -> Result<()> {
    mode::require(session, Mode::Application)?;
    let driver = session.driver();

    info!("Acquiring current GPIO config");
    let mut table = driver.gpio_config()?;
    info!("Current GPIO config:");
    log_table(&table);
    let current_mask = driver.antenna_mask()?;
    info!("Current antenna mask: {}", current_mask.bits());

    info!("Setting GPIOs for {} antennas", layout.antenna_count());
    layout.apply(&mut table)?;

    info!("Setting new GPIO config:");
    driver.set_gpio_config(&table)?;
    log_table(&table);

    let mask = layout.antenna_mask();
    info!(
        "Setting antenna mask for {} antennas: {}",
        layout.antenna_count(),
        mask.bits()
    );
    driver.set_antenna_mask(mask)?;

    info!("Storing config");
    driver.store_setup(StoreScope::All)?;
    Ok(())
}
