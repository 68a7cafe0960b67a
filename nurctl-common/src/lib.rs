// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Control logic for serial-attached NUR RFID reader modules.
//!
//! The driver is reached only through [`ReaderDriver`]. On top of it this
//! crate provides the session lifecycle (discovery, bounded connect retry,
//! guaranteed release), mode preconditions, the single-antenna mask
//! transaction used by tuning and detection, firmware programming, and the
//! GPIO / configuration operations.

pub mod antenna;
pub mod driver;
pub mod error;
pub mod event;
pub mod firmware;
pub mod gpio;
pub mod inspect;
pub mod locate;
pub mod mode;
pub mod protocol;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use driver::{Connector, DriverResult, ReaderDriver};
pub use error::{DriverError, Result, ToolError};
pub use event::{DottedProgress, Event, EventSink, ProgrammingProgress};
pub use session::{CancelToken, ConnectionManager, RetryPolicy, Session};
pub use types::{AntennaId, AntennaMask, GpioEdge, GpioType, Mode};
pub use locate::{DEVICE_COUNT, DEVICE_PREFIX};
