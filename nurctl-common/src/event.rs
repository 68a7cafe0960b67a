// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Asynchronous notifications raised by the reader driver.
//!
//! Drivers deliver every notification as one [`Event`] value through
//! [`EventSink::handle`]. Only programming progress needs a handler;
//! everything else defaults to a no-op. Callbacks may run on a driver-owned
//! thread while the main thread is blocked in a driver call, so sinks must
//! not touch state shared with the caller.

use std::io::Write;
use std::sync::Mutex;

/// Page counter carried by programming-progress notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgrammingProgress {
    pub current_page: u32,
    pub total_pages: u32,
}

impl ProgrammingProgress {
    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 == self.total_pages
    }
}

/// All notification kinds a driver can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    Disconnected,
    ProgrammingProgress(ProgrammingProgress),
    Boot(String),
    IoChange { source: u8, direction: u8 },
    ClientConnected,
    ClientDisconnected,
    DebugMessage(String),
    DeviceSearch,
    EpcEnum,
    FrequencyHop { frequency: u32 },
    InventoryStream,
    InventoryExtendedStream,
    Log { level: u8, message: String },
    NxpEasAlarm,
    TraceTag,
    TriggeredRead,
    Autotune,
    TagTrackingChange,
    TagTrackingScan,
}

/// Receiver for driver notifications.
pub trait EventSink: Send + Sync {
    fn programming_progress(&self, progress: ProgrammingProgress);

    /// The disconnect acknowledgement is not awaited by the session.
    fn disconnected(&self) {}

    /// Single dispatch point for all event kinds.
    fn handle(&self, event: &Event) {
        match event {
            Event::ProgrammingProgress(progress) => self.programming_progress(*progress),
            Event::Disconnected => self.disconnected(),
            _ => {}
        }
    }
}

/// Prints one dot per programmed page and ends the line on the last page.
pub struct DottedProgress<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> DottedProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for DottedProgress<W> {
    fn programming_progress(&self, progress: ProgrammingProgress) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Progress output is best effort.
        let _ = out.write_all(b".");
        if progress.is_last_page() {
            let _ = out.write_all(b"\n");
        }
        let _ = out.flush();
    }
}
