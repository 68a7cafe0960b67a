// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Request/reply link spoken by the serial driver.
//!
//! Frames are postcard-encoded and COBS-delimited (0x00 terminator). Every
//! request gets exactly one reply.

use serde::{Deserialize, Serialize};

use crate::types::{
    AntennaId, AntennaMask, DeviceCaps, GpioConfigEntry, GpioStatus, IrConfig, Mode, ModuleSetup,
    ReaderInfo, ReflectedPower, RegionInfo, StoreScope, TuneBand, TuneResult,
};

// --- Link constants ---

pub const BAUD_RATE: u32 = 115_200;

/// Default timeout for a request/reply exchange in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Timeout for `StartProgram`, which erases the target area first.
pub const ERASE_TIMEOUT_MS: u64 = 60_000;

/// Image bytes carried by one `ProgramPage` request.
pub const PROGRAM_PAGE_SIZE: usize = 256;

/// Leading image bytes sent with `InspectImage`.
pub const IMAGE_HEADER_SIZE: usize = 1024;

/// Largest encoded frame either side may send.
pub const MAX_FRAME_SIZE: usize = 2048;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramTarget {
    Application,
    Bootloader,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Request {
    Ping,
    GetMode,
    GetReaderInfo,
    GetModuleSetup,
    GetIrConfig,
    GetDeviceCaps,
    GetRegionInfo,
    GetAntennaMask,
    SetAntennaMask { mask: AntennaMask },
    StoreSetup { scope: StoreScope },
    GetGpioConfig,
    SetGpioConfig { entries: Vec<GpioConfigEntry> },
    GetGpioStatus { io: u8 },
    SetGpioState { io: u8, on: bool },
    Tune { antenna: AntennaId, band: TuneBand },
    GetReflectedPower,
    EnterBootloader,
    ExitBootloader,
    StartProgram {
        target: ProgramTarget,
        size: u32,
        crc32: u32,
        pages: u32,
    },
    ProgramPage { page: u32, data: Vec<u8> },
    FinishProgram,
    InspectImage { module_type: String, header: Vec<u8> },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Reply {
    Ack(AckStatus),
    Mode(Mode),
    ReaderInfo(ReaderInfo),
    ModuleSetup(ModuleSetup),
    IrConfig(IrConfig),
    DeviceCaps(DeviceCaps),
    RegionInfo(RegionInfo),
    AntennaMask(AntennaMask),
    GpioConfig(Vec<GpioConfigEntry>),
    GpioStatus(GpioStatus),
    Tune(Vec<TuneResult>),
    ReflectedPower(ReflectedPower),
    ImageVersion(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Ok,
    /// Module-specific error code
    Error(u16),
    CrcError,
    BadCommand,
    BadState,
    ImageRejected,
}

/// Number of `ProgramPage` requests needed for an image of `len` bytes,
/// or `None` when the count does not fit the 32-bit page counter.
pub fn page_count(len: usize) -> Option<u32> {
    u32::try_from(len.div_ceil(PROGRAM_PAGE_SIZE)).ok()
}
