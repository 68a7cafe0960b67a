// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Capability interface to the reader driver.
//!
//! Every method is one atomic driver call. The state machine in this crate
//! never talks to the wire directly; the bundled serial implementation lives
//! in the `nurctl` binary and tests use an in-memory driver.

use std::path::Path;
use std::sync::Arc;

use crate::error::DriverError;
use crate::event::EventSink;
use crate::types::{
    AntennaId, AntennaMask, DeviceCaps, GpioConfigEntry, GpioStatus, IrConfig, Mode, ModuleSetup,
    ReaderInfo, ReflectedPower, RegionInfo, StoreScope, TuneBand, TuneResult,
};

/// Result type for driver calls
pub type DriverResult<T> = core::result::Result<T, DriverError>;

/// Operations a reader driver provides.
pub trait ReaderDriver {
    /// Register (or with `None`, unregister) the notification receiver.
    fn set_listener(&mut self, sink: Option<Arc<dyn EventSink>>);

    fn connect(&mut self) -> DriverResult<()>;
    fn disconnect(&mut self) -> DriverResult<()>;

    /// Release transport resources. The handle is unusable afterwards.
    fn dispose(&mut self);

    fn mode(&mut self) -> DriverResult<Mode>;
    fn reader_info(&mut self) -> DriverResult<ReaderInfo>;
    fn module_setup(&mut self) -> DriverResult<ModuleSetup>;
    fn ir_config(&mut self) -> DriverResult<IrConfig>;
    fn device_caps(&mut self) -> DriverResult<DeviceCaps>;
    fn region_info(&mut self) -> DriverResult<RegionInfo>;

    fn antenna_mask(&mut self) -> DriverResult<AntennaMask>;
    fn set_antenna_mask(&mut self, mask: AntennaMask) -> DriverResult<()>;

    /// Write the current setup to non-volatile memory.
    fn store_setup(&mut self, scope: StoreScope) -> DriverResult<()>;

    fn gpio_config(&mut self) -> DriverResult<Vec<GpioConfigEntry>>;
    fn set_gpio_config(&mut self, entries: &[GpioConfigEntry]) -> DriverResult<()>;
    fn gpio_status(&mut self, io: u8) -> DriverResult<GpioStatus>;
    fn set_gpio_state(&mut self, io: u8, on: bool) -> DriverResult<()>;

    /// Tune one antenna and persist the result in the module.
    fn tune(&mut self, antenna: AntennaId, band: TuneBand) -> DriverResult<Vec<TuneResult>>;
    fn reflected_power(&mut self) -> DriverResult<ReflectedPower>;

    fn enter_bootloader(&mut self) -> DriverResult<()>;
    fn exit_bootloader(&mut self) -> DriverResult<()>;

    fn program_application(&mut self, image: &Path) -> DriverResult<()>;
    fn program_bootloader(&mut self, image: &Path) -> DriverResult<()>;

    /// Version string embedded in a firmware image built for `module_type`.
    fn image_version(&mut self, image: &Path, module_type: &str) -> DriverResult<String>;
}

/// Opens a fresh driver handle on a device node.
///
/// One handle is created per connection attempt.
pub trait Connector {
    type Driver: ReaderDriver;

    fn open(&mut self, path: &Path) -> DriverResult<Self::Driver>;
}

impl<F, D> Connector for F
where
    F: FnMut(&Path) -> DriverResult<D>,
    D: ReaderDriver,
{
    type Driver = D;

    fn open(&mut self, path: &Path) -> DriverResult<D> {
        self(path)
    }
}
