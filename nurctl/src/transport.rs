// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport and the reader driver built on it.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crc::{Crc, CRC_32_ISO_HDLC};
use log::debug;
use serialport::SerialPort;

use nurctl_common::driver::{DriverResult, ReaderDriver};
use nurctl_common::protocol::{
    page_count, AckStatus, ProgramTarget, Reply, Request, BAUD_RATE, DEFAULT_TIMEOUT_MS,
    ERASE_TIMEOUT_MS, IMAGE_HEADER_SIZE, MAX_FRAME_SIZE, PROGRAM_PAGE_SIZE,
};
use nurctl_common::types::{
    AntennaId, AntennaMask, DeviceCaps, GpioConfigEntry, GpioStatus, IrConfig, Mode, ModuleSetup,
    ReaderInfo, ReflectedPower, RegionInfo, StoreScope, TuneBand, TuneResult,
};
use nurctl_common::{DriverError, Event, EventSink, ProgrammingProgress};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// COBS-framed request/reply link over a serial port.
pub struct Transport {
    port: Box<dyn SerialPort>,
    rx_buf: Vec<u8>,
}

impl Transport {
    /// Open the serial port with the default timeout.
    pub fn new(port_name: &str) -> Result<Self> {
        Self::with_timeout(port_name, DEFAULT_TIMEOUT_MS)
    }

    pub fn with_timeout(port_name: &str, timeout_ms: u64) -> Result<Self> {
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(Duration::from_millis(timeout_ms))
            .open()
            .with_context(|| format!("Failed to open serial port {}", port_name))?;

        Ok(Self {
            port,
            rx_buf: Vec::with_capacity(MAX_FRAME_SIZE),
        })
    }

    pub fn send(&mut self, request: &Request) -> Result<()> {
        let mut buf = [0u8; MAX_FRAME_SIZE];
        let encoded = postcard::to_slice_cobs(request, &mut buf)
            .map_err(|e| anyhow::anyhow!("Failed to serialize request: {}", e))?;
        self.port
            .write_all(encoded)
            .context("Failed to write to serial port")?;
        self.port.flush()?;
        Ok(())
    }

    pub fn receive(&mut self) -> Result<Reply> {
        self.rx_buf.clear();
        let mut byte = [0u8; 1];

        // Read up to the 0x00 frame delimiter
        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    self.rx_buf.push(byte[0]);
                    if byte[0] == 0 {
                        break;
                    }
                    if self.rx_buf.len() > MAX_FRAME_SIZE {
                        bail!("Reply frame exceeds {} bytes", MAX_FRAME_SIZE);
                    }
                }
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    bail!("Timeout waiting for reply");
                }
                Err(e) => bail!("Serial read error: {}", e),
            }
        }

        postcard::from_bytes_cobs(&mut self.rx_buf).map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize reply: {} (raw {} bytes: {:02x?})",
                e,
                self.rx_buf.len(),
                &self.rx_buf[..self.rx_buf.len().min(32)]
            )
        })
    }

    fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
    }

    pub fn send_recv(&mut self, request: &Request) -> Result<Reply> {
        self.drain_rx();
        self.send(request)?;
        self.receive()
    }

    /// Send a request and wait for the reply with a custom timeout.
    pub fn send_recv_timeout(&mut self, request: &Request, timeout_ms: u64) -> Result<Reply> {
        let old_timeout = self.port.timeout();
        self.port
            .set_timeout(Duration::from_millis(timeout_ms))
            .context("Failed to set timeout")?;

        let result = self.send_recv(request);

        let _ = self.port.set_timeout(old_timeout);
        result
    }
}

fn link_error(e: anyhow::Error) -> DriverError {
    DriverError::Transport(format!("{:#}", e))
}

fn unexpected(request: &str, reply: Reply) -> DriverError {
    DriverError::Protocol(format!("Unexpected reply to {}: {:?}", request, reply))
}

/// Byte size and page count of an image, both as sent in `StartProgram`.
fn image_geometry(len: usize) -> DriverResult<(u32, u32)> {
    let too_large = || {
        DriverError::Image(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Image of {} bytes exceeds the 32-bit size field", len),
        ))
    };
    let size = u32::try_from(len).map_err(|_| too_large())?;
    let pages = page_count(len).ok_or_else(too_large)?;
    Ok((size, pages))
}

/// Reader driver speaking the request/reply link on a serial port.
///
/// The link is the postcard/COBS protocol of [`nurctl_common::protocol`],
/// not the binary protocol of the NUR module firmware. A stock module does
/// not answer it; it needs a bridge or firmware that implements these
/// requests. Other drivers plug in through [`ReaderDriver`].
pub struct SerialDriver {
    path: PathBuf,
    transport: Option<Transport>,
    listener: Option<Arc<dyn EventSink>>,
    connected: bool,
}

impl SerialDriver {
    /// Open the serial port at `path`. Used as the session connector.
    pub fn open(path: &Path) -> DriverResult<Self> {
        let transport = Transport::new(&path.to_string_lossy()).map_err(link_error)?;
        Ok(Self {
            path: path.to_path_buf(),
            transport: Some(transport),
            listener: None,
            connected: false,
        })
    }

    fn emit(&self, event: Event) {
        if let Some(listener) = &self.listener {
            listener.handle(&event);
        }
    }

    fn exchange_timeout(&mut self, request: &Request, timeout_ms: u64) -> DriverResult<Reply> {
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        debug!("{} <- {:?}", self.path.display(), request);
        let reply = transport
            .send_recv_timeout(request, timeout_ms)
            .map_err(link_error)?;

        match reply {
            Reply::Ack(AckStatus::Error(code)) => Err(DriverError::Status(code)),
            Reply::Ack(AckStatus::CrcError) => {
                Err(DriverError::Protocol("CRC verification failed".into()))
            }
            Reply::Ack(
                status @ (AckStatus::BadCommand | AckStatus::BadState | AckStatus::ImageRejected),
            ) => Err(DriverError::Protocol(format!("Request rejected: {:?}", status))),
            reply => Ok(reply),
        }
    }

    fn exchange(&mut self, request: &Request) -> DriverResult<Reply> {
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        self.exchange_timeout(request, DEFAULT_TIMEOUT_MS)
    }

    /// Issue a request whose only valid answer is a plain acknowledgement.
    fn command(&mut self, request: Request) -> DriverResult<()> {
        match self.exchange(&request)? {
            Reply::Ack(AckStatus::Ok) => Ok(()),
            other => Err(unexpected(&format!("{:?}", request), other)),
        }
    }

    fn program(&mut self, target: ProgramTarget, image: &Path) -> DriverResult<()> {
        let firmware = fs::read(image)?;
        let (size, pages) = image_geometry(firmware.len())?;
        let crc32 = CRC32.checksum(&firmware);

        debug!(
            "Image {} ({} bytes, CRC32: 0x{:08x}, {} pages)",
            image.display(),
            size,
            crc32,
            pages
        );

        let start = Request::StartProgram {
            target,
            size,
            crc32,
            pages,
        };
        if !self.connected {
            return Err(DriverError::NotConnected);
        }
        match self.exchange_timeout(&start, ERASE_TIMEOUT_MS)? {
            Reply::Ack(AckStatus::Ok) => {}
            other => return Err(unexpected("StartProgram", other)),
        }

        for (page, data) in (0u32..).zip(firmware.chunks(PROGRAM_PAGE_SIZE)) {
            self.command(Request::ProgramPage {
                page,
                data: data.to_vec(),
            })?;
            self.emit(Event::ProgrammingProgress(ProgrammingProgress {
                current_page: page,
                total_pages: pages,
            }));
        }

        self.command(Request::FinishProgram)
    }
}

impl ReaderDriver for SerialDriver {
    fn set_listener(&mut self, sink: Option<Arc<dyn EventSink>>) {
        self.listener = sink;
    }

    fn connect(&mut self) -> DriverResult<()> {
        self.connected = true;
        if let Err(e) = self.command(Request::Ping) {
            self.connected = false;
            return Err(e);
        }
        self.emit(Event::Connected);
        Ok(())
    }

    fn disconnect(&mut self) -> DriverResult<()> {
        // Local only: the module may already be rebooting.
        self.connected = false;
        self.emit(Event::Disconnected);
        Ok(())
    }

    fn dispose(&mut self) {
        self.connected = false;
        self.transport = None;
    }

    fn mode(&mut self) -> DriverResult<Mode> {
        match self.exchange(&Request::GetMode)? {
            Reply::Mode(mode) => Ok(mode),
            other => Err(unexpected("GetMode", other)),
        }
    }

    fn reader_info(&mut self) -> DriverResult<ReaderInfo> {
        match self.exchange(&Request::GetReaderInfo)? {
            Reply::ReaderInfo(info) => Ok(info),
            other => Err(unexpected("GetReaderInfo", other)),
        }
    }

    fn module_setup(&mut self) -> DriverResult<ModuleSetup> {
        match self.exchange(&Request::GetModuleSetup)? {
            Reply::ModuleSetup(setup) => Ok(setup),
            other => Err(unexpected("GetModuleSetup", other)),
        }
    }

    fn ir_config(&mut self) -> DriverResult<IrConfig> {
        match self.exchange(&Request::GetIrConfig)? {
            Reply::IrConfig(config) => Ok(config),
            other => Err(unexpected("GetIrConfig", other)),
        }
    }

    fn device_caps(&mut self) -> DriverResult<DeviceCaps> {
        match self.exchange(&Request::GetDeviceCaps)? {
            Reply::DeviceCaps(caps) => Ok(caps),
            other => Err(unexpected("GetDeviceCaps", other)),
        }
    }

    fn region_info(&mut self) -> DriverResult<RegionInfo> {
        match self.exchange(&Request::GetRegionInfo)? {
            Reply::RegionInfo(info) => Ok(info),
            other => Err(unexpected("GetRegionInfo", other)),
        }
    }

    fn antenna_mask(&mut self) -> DriverResult<AntennaMask> {
        match self.exchange(&Request::GetAntennaMask)? {
            Reply::AntennaMask(mask) => Ok(mask),
            other => Err(unexpected("GetAntennaMask", other)),
        }
    }

    fn set_antenna_mask(&mut self, mask: AntennaMask) -> DriverResult<()> {
        self.command(Request::SetAntennaMask { mask })
    }

    fn store_setup(&mut self, scope: StoreScope) -> DriverResult<()> {
        self.command(Request::StoreSetup { scope })
    }

    fn gpio_config(&mut self) -> DriverResult<Vec<GpioConfigEntry>> {
        match self.exchange(&Request::GetGpioConfig)? {
            Reply::GpioConfig(entries) => Ok(entries),
            other => Err(unexpected("GetGpioConfig", other)),
        }
    }

    fn set_gpio_config(&mut self, entries: &[GpioConfigEntry]) -> DriverResult<()> {
        self.command(Request::SetGpioConfig {
            entries: entries.to_vec(),
        })
    }

    fn gpio_status(&mut self, io: u8) -> DriverResult<GpioStatus> {
        match self.exchange(&Request::GetGpioStatus { io })? {
            Reply::GpioStatus(status) => Ok(status),
            other => Err(unexpected("GetGpioStatus", other)),
        }
    }

    fn set_gpio_state(&mut self, io: u8, on: bool) -> DriverResult<()> {
        self.command(Request::SetGpioState { io, on })
    }

    fn tune(&mut self, antenna: AntennaId, band: TuneBand) -> DriverResult<Vec<TuneResult>> {
        match self.exchange(&Request::Tune { antenna, band })? {
            Reply::Tune(results) => Ok(results),
            other => Err(unexpected("Tune", other)),
        }
    }

    fn reflected_power(&mut self) -> DriverResult<ReflectedPower> {
        match self.exchange(&Request::GetReflectedPower)? {
            Reply::ReflectedPower(sample) => Ok(sample),
            other => Err(unexpected("GetReflectedPower", other)),
        }
    }

    fn enter_bootloader(&mut self) -> DriverResult<()> {
        self.command(Request::EnterBootloader)
    }

    fn exit_bootloader(&mut self) -> DriverResult<()> {
        self.command(Request::ExitBootloader)
    }

    fn program_application(&mut self, image: &Path) -> DriverResult<()> {
        self.program(ProgramTarget::Application, image)
    }

    fn program_bootloader(&mut self, image: &Path) -> DriverResult<()> {
        self.program(ProgramTarget::Bootloader, image)
    }

    fn image_version(&mut self, image: &Path, module_type: &str) -> DriverResult<String> {
        let mut header = fs::read(image)?;
        header.truncate(IMAGE_HEADER_SIZE);

        let request = Request::InspectImage {
            module_type: module_type.to_string(),
            header,
        };
        match self.exchange(&request)? {
            Reply::ImageVersion(version) => Ok(version),
            other => Err(unexpected("InspectImage", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_geometry_counts_pages() {
        assert_eq!(image_geometry(0).unwrap(), (0, 0));
        assert_eq!(
            image_geometry(PROGRAM_PAGE_SIZE * 3 + 1).unwrap(),
            (PROGRAM_PAGE_SIZE as u32 * 3 + 1, 4)
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_image_geometry_rejects_oversized_image() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(image_geometry(len), Err(DriverError::Image(_))));
    }
}
