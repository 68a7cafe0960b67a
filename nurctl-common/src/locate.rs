// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Device node discovery.

use std::path::PathBuf;

/// Prefix of the CDC ACM device nodes the module enumerates as.
pub const DEVICE_PREFIX: &str = "/dev/ttyACM";

/// Number of candidate nodes scanned (`ttyACM0` to `ttyACM126`).
pub const DEVICE_COUNT: u32 = 127;

/// Return the lowest-numbered existing node `prefix0 .. prefix{count-1}`.
pub fn locate(prefix: &str, count: u32) -> Option<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("{}{}", prefix, i)))
        .find(|path| path.exists())
}
