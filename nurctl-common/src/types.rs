// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Reader data model: modes, antenna masks, GPIO table entries, tuning and
//! reflected-power samples, and the diagnostic structures shown by `-c`.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Module type string the firmware images are checked against.
pub const MODULE_TYPE: &str = "NUR-05WL2";

/// Operating mode reported by the module.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Application,
    Bootloader,
    Unknown,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Application => f.write_str("application"),
            Mode::Bootloader => f.write_str("boot loader"),
            Mode::Unknown => f.write_str("unknown"),
        }
    }
}

// --- Antennas ---

/// Antenna port number, 1 to 4.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AntennaId(u8);

impl AntennaId {
    pub const ALL: [AntennaId; 4] = [AntennaId(1), AntennaId(2), AntennaId(3), AntennaId(4)];

    pub fn new(id: u8) -> Result<Self, ToolError> {
        if (1..=4).contains(&id) {
            Ok(Self(id))
        } else {
            Err(ToolError::IllegalArgument(format!("Invalid antenna ID: {}", id)))
        }
    }

    /// The single-antenna mask selecting only this port.
    pub fn mask(self) -> AntennaMask {
        AntennaMask(1 << (self.0 - 1))
    }
}

impl core::str::FromStr for AntennaId {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u8>()
            .map_err(|_| ToolError::IllegalArgument(format!("Unrecognized antenna ID: {}", s)))?;
        Self::new(id)
    }
}

impl fmt::Display for AntennaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bitset over antenna ports 1-4 as stored in the module setup.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AntennaMask(pub u32);

impl AntennaMask {
    pub const ANTENNA_1: AntennaMask = AntennaMask(0x1);
    pub const ANTENNA_2: AntennaMask = AntennaMask(0x2);
    pub const ANTENNA_3: AntennaMask = AntennaMask(0x4);
    pub const ANTENNA_4: AntennaMask = AntennaMask(0x8);

    pub const fn union(self, other: AntennaMask) -> AntennaMask {
        AntennaMask(self.0 | other.0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AntennaMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:b}", self.0)
    }
}

// --- Regions and tuning ---

/// Regulatory region configured in the module setup.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Eu,
    Fcc,
    Other(u32),
}

impl Region {
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => Region::Eu,
            1 => Region::Fcc,
            other => Region::Other(other),
        }
    }
}

/// Tuning sweep to run: EU is a single band, FCC covers several sub-bands.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuneBand {
    Eu,
    Fcc,
}

impl TuneBand {
    /// Band to tune for a region, or `None` when the region is not tunable.
    pub fn for_region(region: Region) -> Option<Self> {
        match region {
            Region::Eu => Some(TuneBand::Eu),
            Region::Fcc => Some(TuneBand::Fcc),
            Region::Other(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TuneResult {
    pub dbm: f32,
}

/// Raw reflected power measurement (I/Q components and scale divider).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectedPower {
    pub i_part: i32,
    pub q_part: i32,
    pub divider: i32,
}

/// Which part of the module setup to write to non-volatile memory.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    AntennaMask,
    All,
}

// --- GPIO ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioType {
    Output,
    Input,
    RfidOn,
    RfidRead,
    Beeper,
    AntCtl1,
    AntCtl2,
}

impl TryFrom<u8> for GpioType {
    type Error = ToolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GpioType::Output),
            1 => Ok(GpioType::Input),
            2 => Ok(GpioType::RfidOn),
            3 => Ok(GpioType::RfidRead),
            4 => Ok(GpioType::Beeper),
            5 => Ok(GpioType::AntCtl1),
            6 => Ok(GpioType::AntCtl2),
            _ => Err(ToolError::IllegalArgument(format!(
                "Unknown GPIO type: {}",
                value
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioEdge {
    Falling,
    Rising,
}

impl TryFrom<u8> for GpioEdge {
    type Error = ToolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GpioEdge::Falling),
            1 => Ok(GpioEdge::Rising),
            _ => Err(ToolError::IllegalArgument(format!(
                "Unknown GPIO edge: {}",
                value
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioAction {
    None,
    Notify,
    ScanTags,
    Inventory,
}

/// One row of the module's GPIO configuration table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioConfigEntry {
    pub gpio_type: GpioType,
    pub edge: GpioEdge,
    pub enabled: bool,
    pub available: bool,
    pub action: GpioAction,
}

impl GpioConfigEntry {
    /// Overwrite the user-configurable part of the entry.
    pub fn configure(&mut self, gpio_type: GpioType, edge: GpioEdge, enabled: bool) {
        self.gpio_type = gpio_type;
        self.edge = edge;
        self.enabled = enabled;
    }
}

/// Current state of a single GPIO pin.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioStatus {
    pub number: u8,
    pub enabled: bool,
    pub gpio_type: GpioType,
    pub state: bool,
}

// --- Diagnostic structures ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReaderInfo {
    pub serial: String,
    pub alt_serial: String,
    pub name: String,
    pub fcc_id: String,
    pub hw_version: String,
    pub sw_version: String,
    pub num_gpio: u32,
    pub num_sensors: u32,
    pub num_regions: u32,
    pub num_antennas: u32,
    pub max_antennas: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ModuleSetup {
    pub region_id: u32,
    pub link_freq: u32,
    pub rx_decoding: u32,
    pub tx_level: u32,
    pub tx_modulation: u32,
    pub inventory_q: u32,
    pub inventory_session: u32,
    pub inventory_rounds: u32,
    pub antenna_mask: AntennaMask,
    pub scan_single_trigger_timeout: u32,
    pub inventory_trigger_timeout: u32,
    pub selected_antenna: i32,
    pub op_flags: u32,
}

impl ModuleSetup {
    pub fn region(&self) -> Region {
        Region::from_id(self.region_id)
    }
}

/// Inventory-read configuration: memory read along with every inventoried tag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrConfig {
    pub is_running: bool,
    pub ir_type: u32,
    pub bank: u32,
    pub address: u32,
    pub word_count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceCaps {
    pub flag_set1: u32,
    pub flag_set2: u32,
    pub max_tx_dbm: i32,
    pub tx_attn_step: i32,
    pub max_tx_mw: u32,
    pub tx_steps: u32,
    pub sz_tag_buffer: u32,
    pub cur_tag_buffer: u32,
    pub max_ant: u32,
    pub max_gpio: u32,
    pub chip_version: u32,
    pub module_type: u32,
    pub module_config_flags: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub region_id: u32,
    pub base_frequency: u32,
    pub channel_spacing: u32,
    pub channel_count: u32,
    pub channel_time: u32,
    pub name: String,
}

/// A named value in a diagnostic dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(name: &'static str, value: impl fmt::Display) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }
}

/// Static, hand-declared field table for a diagnostic structure.
pub trait Describe {
    fn fields(&self) -> Vec<Field>;
}

impl Describe for ReaderInfo {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("serial", &self.serial),
            Field::new("altSerial", &self.alt_serial),
            Field::new("name", &self.name),
            Field::new("fccId", &self.fcc_id),
            Field::new("hwVersion", &self.hw_version),
            Field::new("swVersion", &self.sw_version),
            Field::new("numGpio", self.num_gpio),
            Field::new("numSensors", self.num_sensors),
            Field::new("numRegions", self.num_regions),
            Field::new("numAntennas", self.num_antennas),
            Field::new("maxAntennas", self.max_antennas),
        ]
    }
}

impl Describe for ModuleSetup {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("regionId", self.region_id),
            Field::new("linkFreq", self.link_freq),
            Field::new("rxDecoding", self.rx_decoding),
            Field::new("txLevel", self.tx_level),
            Field::new("txModulation", self.tx_modulation),
            Field::new("inventoryQ", self.inventory_q),
            Field::new("inventorySession", self.inventory_session),
            Field::new("inventoryRounds", self.inventory_rounds),
            Field::new("antennaMask", self.antenna_mask.bits()),
            Field::new("scanSingleTriggerTimeout", self.scan_single_trigger_timeout),
            Field::new("inventoryTriggerTimeout", self.inventory_trigger_timeout),
            Field::new("selectedAntenna", self.selected_antenna),
            Field::new("opFlags", format_args!("0x{:08x}", self.op_flags)),
        ]
    }
}

impl Describe for IrConfig {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("IsRunning", self.is_running),
            Field::new("irType", self.ir_type),
            Field::new("irBank", self.bank),
            Field::new("irAddr", self.address),
            Field::new("irWordCount", self.word_count),
        ]
    }
}

impl Describe for DeviceCaps {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("flagSet1", format_args!("0x{:08x}", self.flag_set1)),
            Field::new("flagSet2", format_args!("0x{:08x}", self.flag_set2)),
            Field::new("maxTxdBm", self.max_tx_dbm),
            Field::new("txAttnStep", self.tx_attn_step),
            Field::new("maxTxmW", self.max_tx_mw),
            Field::new("txSteps", self.tx_steps),
            Field::new("szTagBuffer", self.sz_tag_buffer),
            Field::new("curCfgMaxAnt", self.max_ant),
            Field::new("curCfgMaxGPIO", self.max_gpio),
            Field::new("chipVersion", self.chip_version),
            Field::new("moduleType", self.module_type),
            Field::new("moduleConfigFlags", format_args!("0x{:08x}", self.module_config_flags)),
            Field::new("curTagBuffer", self.cur_tag_buffer),
        ]
    }
}

impl Describe for RegionInfo {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("regionId", self.region_id),
            Field::new("baseFrequency", self.base_frequency),
            Field::new("channelSpacing", self.channel_spacing),
            Field::new("channelCount", self.channel_count),
            Field::new("channelTime", self.channel_time),
            Field::new("name", &self.name),
        ]
    }
}

impl Describe for GpioStatus {
    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("number", self.number),
            Field::new("enabled", self.enabled),
            Field::new("type", format_args!("{:?}", self.gpio_type)),
            Field::new("state", self.state),
        ]
    }
}
