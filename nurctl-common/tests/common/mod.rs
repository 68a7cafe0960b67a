// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory reader used by the integration tests.
//!
//! The simulated module state lives behind an `Rc<RefCell<_>>` so a test can
//! keep inspecting it after the session owning the driver is gone.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nurctl_common::driver::{DriverResult, ReaderDriver};
use nurctl_common::event::{Event, EventSink, ProgrammingProgress};
use nurctl_common::types::{
    AntennaId, AntennaMask, DeviceCaps, GpioAction, GpioConfigEntry, GpioEdge, GpioStatus,
    GpioType, IrConfig, Mode, ModuleSetup, ReaderInfo, ReflectedPower, RegionInfo, StoreScope, TuneBand,
    TuneResult,
};
use nurctl_common::{ConnectionManager, DriverError, RetryPolicy, Session};

/// Status code returned by scripted failures.
pub const FAILURE_STATUS: u16 = 0x20;

pub struct Device {
    pub mode: Mode,
    pub mask: AntennaMask,
    pub stored_mask: AntennaMask,
    pub gpio: Vec<GpioConfigEntry>,
    pub stored_gpio: Vec<GpioConfigEntry>,
    pub gpio_states: Vec<bool>,
    pub region_id: u32,
    pub sw_version: String,
    pub image_version: String,
    pub reflected: ReflectedPower,
    pub tune_dbm: f32,
    pub program_pages: u32,
    /// Number of initial `connect` calls that fail.
    pub connect_failures: u32,
    /// method -> 1-based call number that fails (0 fails every call)
    pub failures: HashMap<&'static str, usize>,
    pub counts: HashMap<&'static str, usize>,
    pub calls: Vec<&'static str>,
    pub mask_history: Vec<AntennaMask>,
    pub programmed: Vec<(&'static str, PathBuf)>,
    pub tuned: Vec<(AntennaId, TuneBand)>,
    pub opens: u32,
    pub listener: Option<Arc<dyn EventSink>>,
}

pub fn gpio_entry(gpio_type: GpioType, edge: GpioEdge, enabled: bool) -> GpioConfigEntry {
    GpioConfigEntry {
        gpio_type,
        edge,
        enabled,
        available: true,
        action: GpioAction::None,
    }
}

impl Default for Device {
    fn default() -> Self {
        let gpio = vec![gpio_entry(GpioType::Output, GpioEdge::Rising, false); 5];
        Self {
            mode: Mode::Application,
            mask: AntennaMask(0x3),
            stored_mask: AntennaMask(0x3),
            stored_gpio: gpio.clone(),
            gpio,
            gpio_states: vec![false; 5],
            region_id: 0,
            sw_version: "5.10-A".to_string(),
            image_version: "5.11-A".to_string(),
            reflected: ReflectedPower {
                i_part: 3,
                q_part: 4,
                divider: 50,
            },
            tune_dbm: -12.5,
            program_pages: 4,
            connect_failures: 0,
            failures: HashMap::new(),
            counts: HashMap::new(),
            calls: Vec::new(),
            mask_history: Vec::new(),
            programmed: Vec::new(),
            tuned: Vec::new(),
            opens: 0,
            listener: None,
        }
    }
}

impl Device {
    pub fn shared() -> Rc<RefCell<Device>> {
        Rc::new(RefCell::new(Device::default()))
    }

    pub fn count(&self, method: &str) -> usize {
        self.counts.get(method).copied().unwrap_or(0)
    }

    /// Make the `nth` call (1-based) of `method` fail; 0 fails all calls.
    pub fn fail(&mut self, method: &'static str, nth: usize) {
        self.failures.insert(method, nth);
    }
}

pub struct MockDriver {
    dev: Rc<RefCell<Device>>,
}

impl MockDriver {
    pub fn new(dev: Rc<RefCell<Device>>) -> Self {
        Self { dev }
    }

    fn call(&self, method: &'static str) -> DriverResult<()> {
        let mut dev = self.dev.borrow_mut();
        dev.calls.push(method);
        let count = {
            let count = dev.counts.entry(method).or_insert(0);
            *count += 1;
            *count
        };
        match dev.failures.get(method) {
            Some(&0) => Err(DriverError::Status(FAILURE_STATUS)),
            Some(&nth) if nth == count => Err(DriverError::Status(FAILURE_STATUS)),
            _ => Ok(()),
        }
    }

    fn emit(&self, event: Event) {
        let listener = self.dev.borrow().listener.clone();
        if let Some(listener) = listener {
            listener.handle(&event);
        }
    }
}

impl ReaderDriver for MockDriver {
    fn set_listener(&mut self, sink: Option<Arc<dyn EventSink>>) {
        let _ = self.call("set_listener");
        self.dev.borrow_mut().listener = sink;
    }

    fn connect(&mut self) -> DriverResult<()> {
        self.call("connect")?;
        let mut dev = self.dev.borrow_mut();
        if dev.connect_failures > 0 {
            dev.connect_failures -= 1;
            return Err(DriverError::Transport("no answer".into()));
        }
        Ok(())
    }

    fn disconnect(&mut self) -> DriverResult<()> {
        self.call("disconnect")?;
        self.emit(Event::Disconnected);
        Ok(())
    }

    fn dispose(&mut self) {
        let _ = self.call("dispose");
    }

    fn mode(&mut self) -> DriverResult<Mode> {
        self.call("mode")?;
        Ok(self.dev.borrow().mode)
    }

    fn reader_info(&mut self) -> DriverResult<ReaderInfo> {
        self.call("reader_info")?;
        Ok(ReaderInfo {
            serial: "1234".into(),
            alt_serial: String::new(),
            name: "NUR-05WL2".into(),
            fcc_id: String::new(),
            hw_version: "1.0".into(),
            sw_version: self.dev.borrow().sw_version.clone(),
            num_gpio: 5,
            num_sensors: 0,
            num_regions: 16,
            num_antennas: 4,
            max_antennas: 4,
        })
    }

    fn module_setup(&mut self) -> DriverResult<ModuleSetup> {
        self.call("module_setup")?;
        let dev = self.dev.borrow();
        Ok(ModuleSetup {
            region_id: dev.region_id,
            link_freq: 256_000,
            rx_decoding: 2,
            tx_level: 0,
            tx_modulation: 1,
            inventory_q: 0,
            inventory_session: 0,
            inventory_rounds: 0,
            antenna_mask: dev.mask,
            scan_single_trigger_timeout: 500,
            inventory_trigger_timeout: 0,
            selected_antenna: -1,
            op_flags: 0,
        })
    }

    fn ir_config(&mut self) -> DriverResult<IrConfig> {
        self.call("ir_config")?;
        Ok(IrConfig {
            is_running: false,
            ir_type: 0,
            bank: 2,
            address: 0,
            word_count: 6,
        })
    }

    fn device_caps(&mut self) -> DriverResult<DeviceCaps> {
        self.call("device_caps")?;
        Ok(DeviceCaps {
            flag_set1: 0,
            flag_set2: 0,
            max_tx_dbm: 27,
            tx_attn_step: 1,
            max_tx_mw: 500,
            tx_steps: 20,
            sz_tag_buffer: 200,
            cur_tag_buffer: 0,
            max_ant: 4,
            max_gpio: 5,
            chip_version: 1,
            module_type: 5,
            module_config_flags: 0,
        })
    }

    fn region_info(&mut self) -> DriverResult<RegionInfo> {
        self.call("region_info")?;
        Ok(RegionInfo {
            region_id: self.dev.borrow().region_id,
            base_frequency: 865_700,
            channel_spacing: 600,
            channel_count: 4,
            channel_time: 3960,
            name: "Europe".into(),
        })
    }

    fn antenna_mask(&mut self) -> DriverResult<AntennaMask> {
        self.call("antenna_mask")?;
        Ok(self.dev.borrow().mask)
    }

    fn set_antenna_mask(&mut self, mask: AntennaMask) -> DriverResult<()> {
        self.call("set_antenna_mask")?;
        let mut dev = self.dev.borrow_mut();
        dev.mask = mask;
        dev.mask_history.push(mask);
        Ok(())
    }

    fn store_setup(&mut self, scope: StoreScope) -> DriverResult<()> {
        self.call("store_setup")?;
        let mut dev = self.dev.borrow_mut();
        dev.stored_mask = dev.mask;
        if scope == StoreScope::All {
            dev.stored_gpio = dev.gpio.clone();
        }
        Ok(())
    }

    fn gpio_config(&mut self) -> DriverResult<Vec<GpioConfigEntry>> {
        self.call("gpio_config")?;
        Ok(self.dev.borrow().gpio.clone())
    }

    fn set_gpio_config(&mut self, entries: &[GpioConfigEntry]) -> DriverResult<()> {
        self.call("set_gpio_config")?;
        self.dev.borrow_mut().gpio = entries.to_vec();
        Ok(())
    }

    fn gpio_status(&mut self, io: u8) -> DriverResult<GpioStatus> {
        self.call("gpio_status")?;
        let dev = self.dev.borrow();
        let index = usize::from(io);
        let entry = dev
            .gpio
            .get(index)
            .ok_or(DriverError::Status(FAILURE_STATUS))?;
        Ok(GpioStatus {
            number: io,
            enabled: entry.enabled,
            gpio_type: entry.gpio_type,
            state: dev.gpio_states[index],
        })
    }

    fn set_gpio_state(&mut self, io: u8, on: bool) -> DriverResult<()> {
        self.call("set_gpio_state")?;
        let mut dev = self.dev.borrow_mut();
        let state = dev
            .gpio_states
            .get_mut(usize::from(io))
            .ok_or(DriverError::Status(FAILURE_STATUS))?;
        *state = on;
        Ok(())
    }

    fn tune(&mut self, antenna: AntennaId, band: TuneBand) -> DriverResult<Vec<TuneResult>> {
        self.call("tune")?;
        let mut dev = self.dev.borrow_mut();
        dev.tuned.push((antenna, band));
        let results = match band {
            TuneBand::Eu => 1,
            TuneBand::Fcc => 6,
        };
        Ok(vec![TuneResult { dbm: dev.tune_dbm }; results])
    }

    fn reflected_power(&mut self) -> DriverResult<ReflectedPower> {
        self.call("reflected_power")?;
        Ok(self.dev.borrow().reflected)
    }

    fn enter_bootloader(&mut self) -> DriverResult<()> {
        self.call("enter_bootloader")?;
        self.dev.borrow_mut().mode = Mode::Bootloader;
        Ok(())
    }

    fn exit_bootloader(&mut self) -> DriverResult<()> {
        self.call("exit_bootloader")?;
        self.dev.borrow_mut().mode = Mode::Application;
        Ok(())
    }

    fn program_application(&mut self, image: &Path) -> DriverResult<()> {
        self.call("program_application")?;
        self.program("application", image);
        Ok(())
    }

    fn program_bootloader(&mut self, image: &Path) -> DriverResult<()> {
        self.call("program_bootloader")?;
        self.program("bootloader", image);
        Ok(())
    }

    fn image_version(&mut self, _image: &Path, _module_type: &str) -> DriverResult<String> {
        self.call("image_version")?;
        Ok(self.dev.borrow().image_version.clone())
    }
}

impl MockDriver {
    fn program(&self, kind: &'static str, image: &Path) {
        let total_pages = self.dev.borrow().program_pages;
        for current_page in 0..total_pages {
            self.emit(Event::ProgrammingProgress(ProgrammingProgress {
                current_page,
                total_pages,
            }));
        }
        self.dev
            .borrow_mut()
            .programmed
            .push((kind, image.to_path_buf()));
    }
}

/// Event sink that records every progress notification.
#[derive(Default)]
pub struct RecordingSink {
    pub progress: Mutex<Vec<ProgrammingProgress>>,
    pub disconnects: Mutex<u32>,
}

impl EventSink for RecordingSink {
    fn programming_progress(&self, progress: ProgrammingProgress) {
        if let Ok(mut seen) = self.progress.lock() {
            seen.push(progress);
        }
    }

    fn disconnected(&self) {
        if let Ok(mut count) = self.disconnects.lock() {
            *count += 1;
        }
    }
}

pub const NO_WAIT: RetryPolicy = RetryPolicy {
    attempts: 3,
    interval: Duration::ZERO,
};

pub type MockConnector = Box<dyn FnMut(&Path) -> DriverResult<MockDriver>>;

/// Connection manager whose connector hands out drivers on `dev`.
pub fn manager(dev: &Rc<RefCell<Device>>) -> ConnectionManager<MockConnector> {
    manager_with_sink(dev, Arc::new(RecordingSink::default()))
}

pub fn manager_with_sink(
    dev: &Rc<RefCell<Device>>,
    sink: Arc<dyn EventSink>,
) -> ConnectionManager<MockConnector> {
    let dev = Rc::clone(dev);
    let connector: MockConnector = Box::new(move |_path: &Path| {
        dev.borrow_mut().opens += 1;
        Ok(MockDriver::new(Rc::clone(&dev)))
    });
    ConnectionManager::new(connector, sink).with_policy(NO_WAIT)
}

/// Open a session on `dev` in its current mode.
pub fn open_session(dev: &Rc<RefCell<Device>>) -> Session<MockDriver> {
    match manager(dev).acquire(Path::new("/dev/ttyACM0")) {
        Ok(session) => session,
        Err(e) => panic!("acquire failed: {}", e),
    }
}
