// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Single-antenna operations: tuning and connection detection.
//!
//! Both run inside [`with_single_antenna`], which narrows the persisted
//! antenna mask to one port for the duration of the body and restores the
//! saved mask on every exit path.

use log::{info, warn};

use crate::driver::{DriverResult, ReaderDriver};
use crate::error::{DriverError, Result, ToolError};
use crate::mode;
use crate::session::Session;
use crate::types::{
    AntennaId, AntennaMask, Mode, ReflectedPower, StoreScope, TuneBand, TuneResult,
};

/// Value reported when the reflected power cannot be expressed in dB.
pub const REFLECTED_POWER_FLOOR_DB: f64 = -30.0;

/// Run `body` with only `antenna` enabled in the persisted antenna mask.
///
/// The mask read on entry is written back (and persisted) before returning,
/// whether the body succeeded or not. A failed restore is reported as
/// [`ToolError::MaskRestore`]; otherwise the body's own result is returned.
pub fn with_single_antenna<D, T>(
    session: &mut Session<D>,
    antenna: AntennaId,
    body: impl FnOnce(&mut Session<D>, AntennaId) -> Result<T>,
) -> Result<T>
where
    D: ReaderDriver,
{
    let saved = session.driver().antenna_mask()?;
    info!("Current antenna mask: {}", saved);

    let single = antenna.mask();
    if saved == single {
        return body(session, antenna);
    }

    let outcome = apply_mask(session, single).and_then(|()| body(session, antenna));

    if let Err(e) = restore_mask(session, saved) {
        if let Err(body_err) = &outcome {
            warn!("Operation failed before mask restore: {}", body_err);
        }
        return Err(e);
    }
    outcome
}

fn apply_mask<D: ReaderDriver>(session: &mut Session<D>, mask: AntennaMask) -> Result<()> {
    info!("Setting antenna mask: {}", mask);
    let driver = session.driver();
    driver.set_antenna_mask(mask)?;
    driver.store_setup(StoreScope::AntennaMask)?;
    Ok(())
}

fn restore_mask<D: ReaderDriver>(session: &mut Session<D>, saved: AntennaMask) -> Result<()> {
    write_back(session.driver(), saved).map_err(|source| ToolError::MaskRestore {
        mask: saved.bits(),
        source,
    })
}

fn write_back<D: ReaderDriver>(driver: &mut D, saved: AntennaMask) -> DriverResult<()> {
    if driver.antenna_mask()? != saved {
        info!("Restoring antenna mask {}", saved);
        driver.set_antenna_mask(saved)?;
        driver.store_setup(StoreScope::AntennaMask)?;
    }
    Ok(())
}

// --- Tuning ---

/// Tune `antenna` for the module's configured region.
///
/// Returns `None` without touching the antenna mask when the region is
/// neither EU nor FCC.
pub fn tune<D: ReaderDriver>(
    session: &mut Session<D>,
    antenna: AntennaId,
) -> Result<Option<TuneResult>> {
    mode::require(session, Mode::Application)?;

    info!("Reading region ID from module.");
    let region = session.driver().module_setup()?.region();

    let Some(band) = TuneBand::for_region(region) else {
        info!(
            "Unsupported or unspecified region is set. Skipping tune of antenna {}",
            antenna
        );
        return Ok(None);
    };

    with_single_antenna(session, antenna, |session, antenna| {
        match band {
            TuneBand::Eu => info!("Tuning antenna {} for region EU.", antenna),
            TuneBand::Fcc => info!("Tuning antenna {} for FCC regions.", antenna),
        }
        let results = session.driver().tune(antenna, band)?;
        let first = results
            .first()
            .copied()
            .ok_or_else(|| DriverError::Protocol("tune returned no results".into()))?;
        info!("Tuned antenna {} with result {} dBm.", antenna, first.dbm);
        Ok(Some(first))
    })
}

// --- Connection detection ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntennaState {
    Connected,
    Disconnected,
}

/// Reflected power of one antenna, in dB, with its classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub antenna: AntennaId,
    pub reflected_db: f64,
    pub state: AntennaState,
}

/// `20 * log10(|I + jQ| / divider)`, clamped to the floor when the ratio
/// is zero, infinite or undefined.
pub fn reflected_power_db(sample: &ReflectedPower) -> (f64, bool) {
    let i = f64::from(sample.i_part);
    let q = f64::from(sample.q_part);
    let ratio = (i * i + q * q).sqrt() / f64::from(sample.divider);
    let db = 20.0 * ratio.log10();
    if db.is_finite() {
        (db, false)
    } else {
        (REFLECTED_POWER_FLOOR_DB, true)
    }
}

/// Classify a sample. Negative dB means connected.
///
/// The clamped floor is the exception: -30 is below zero, so a bare
/// `rf < 0` test would call it connected, but a clamp means there was no
/// measurable load and the sample is reported as disconnected.
pub fn classify(sample: &ReflectedPower) -> (f64, AntennaState) {
    let (db, clamped) = reflected_power_db(sample);
    let state = if !clamped && db < 0.0 {
        AntennaState::Connected
    } else {
        AntennaState::Disconnected
    };
    (db, state)
}

/// Measure reflected power on `antenna` and decide whether it is connected.
pub fn detect<D: ReaderDriver>(
    session: &mut Session<D>,
    antenna: AntennaId,
) -> Result<Detection> {
    mode::require(session, Mode::Application)?;

    with_single_antenna(session, antenna, |session, antenna| {
        let sample = session.driver().reflected_power()?;
        let (reflected_db, state) = classify(&sample);

        info!("Reflected power info for antenna {}: {}", antenna, reflected_db);
        match state {
            AntennaState::Connected => info!("Antenna {} is CONNECTED", antenna),
            AntennaState::Disconnected => info!("Antenna {} is DISCONNECTED", antenna),
        }

        Ok(Detection {
            antenna,
            reflected_db,
            state,
        })
    })
}
