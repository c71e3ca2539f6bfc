// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::SystemBus;
use std::path::Path;
use tracing::info;

/// Builds a SystemBus from a given chip descriptor path.
/// If no path is provided, returns the stock LPC1768 bus.
pub fn build_system_bus(chip_path: Option<&Path>) -> anyhow::Result<SystemBus> {
    let bus = if let Some(chip_path) = chip_path {
        info!("Loading chip descriptor: {:?}", chip_path);
        let chip = lpcsim_config::ChipDescriptor::from_file(chip_path)?;
        SystemBus::from_config(&chip)?
    } else {
        info!("Using default hardware configuration");
        SystemBus::new()
    };

    Ok(bus)
}
