// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::chardev::CharBackend;
use crate::memory::LinearMemory;
use crate::peripherals::syscon::{self, SysCon};
use crate::peripherals::uart::Uart;
use crate::system::lpc1768;
use crate::{Peripheral, SimResult, SimulationError};
use lpcsim_config::{parse_size, ChipDescriptor};

pub struct PeripheralEntry {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub irq: Option<u32>,
    pub dev: Box<dyn Peripheral>,
}

pub struct SystemBus {
    pub flash: LinearMemory,
    pub ram: LinearMemory,
    pub ahb_ram: Option<LinearMemory>,
    pub peripherals: Vec<PeripheralEntry>,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    pub fn new() -> Self {
        // Default initialization mirrors the stock LPC1768 board.
        Self {
            flash: LinearMemory::new(lpc1768::FLASH_SIZE, lpc1768::FLASH_BASE),
            ram: LinearMemory::new(lpc1768::SRAM_SIZE, lpc1768::SRAM_BASE),
            ahb_ram: Some(LinearMemory::new(
                lpc1768::AHB_SRAM_SIZE,
                lpc1768::AHB_SRAM_BASE,
            )),
            peripherals: vec![
                PeripheralEntry {
                    name: "uart0".to_string(),
                    base: lpc1768::UART0_BASE,
                    size: 0x1000,
                    irq: Some(lpc1768::UART0_IRQ),
                    dev: Box::new(Uart::new()),
                },
                PeripheralEntry {
                    name: "syscon".to_string(),
                    base: lpc1768::SYSCON_BASE,
                    size: 0x1000,
                    irq: None,
                    dev: Box::new(SysCon::new(syscon::DEFAULT_MAIN_CLK_HZ)),
                },
            ],
        }
    }

    pub fn from_config(chip: &ChipDescriptor) -> anyhow::Result<Self> {
        let flash_size = parse_size(&chip.flash.size)?;
        let ram_size = parse_size(&chip.ram.size)?;

        let ahb_ram = match &chip.ahb_ram {
            Some(range) => Some(LinearMemory::new(
                parse_size(&range.size)? as usize,
                range.base,
            )),
            None => None,
        };

        let mut bus = Self {
            flash: LinearMemory::new(flash_size as usize, chip.flash.base),
            ram: LinearMemory::new(ram_size as usize, chip.ram.base),
            ahb_ram,
            peripherals: Vec::new(),
        };

        for p_cfg in &chip.peripherals {
            let dev: Box<dyn Peripheral> = match p_cfg.r#type.as_str() {
                "uart" => Box::new(Uart::new()),
                "syscon" => {
                    let main_clk_hz = p_cfg
                        .config
                        .get("main_clk_hz")
                        .and_then(|v| v.as_u64())
                        .map(|v| v as u32)
                        .unwrap_or(syscon::DEFAULT_MAIN_CLK_HZ);
                    Box::new(SysCon::new(main_clk_hz))
                }
                other => {
                    tracing::warn!(
                        "Unsupported peripheral type '{}' for id '{}'; skipping",
                        other,
                        p_cfg.id
                    );
                    continue;
                }
            };

            // Map peripheral window size + IRQ from descriptor when provided.
            // Defaults keep older descriptors working.
            let size = if let Some(size) = &p_cfg.size {
                parse_size(size)?
            } else {
                0x1000 // Default 4KB window
            };

            bus.peripherals.push(PeripheralEntry {
                name: p_cfg.id.clone(),
                base: p_cfg.base_address,
                size,
                irq: p_cfg.irq,
                dev,
            });
        }

        Ok(bus)
    }

    /// Typed access to a peripheral by name.
    pub fn device<T: Peripheral + 'static>(&self, name: &str) -> Option<&T> {
        self.peripherals
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any())
            .and_then(|any| any.downcast_ref::<T>())
    }

    pub fn device_mut<T: Peripheral + 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.peripherals
            .iter_mut()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any_mut())
            .and_then(|any| any.downcast_mut::<T>())
    }

    /// Attach a byte-stream backend to the named UART.
    ///
    /// Returns false when no UART with that name exists on this bus.
    pub fn attach_uart_backend(&mut self, name: &str, backend: Box<dyn CharBackend>) -> bool {
        match self.device_mut::<Uart>(name) {
            Some(uart) => {
                uart.attach_backend(backend);
                true
            }
            None => false,
        }
    }

    pub fn reset_peripherals(&mut self) {
        for p in &mut self.peripherals {
            p.dev.reset();
        }
    }

    pub fn snapshot_peripherals(&self) -> serde_json::Value {
        let mut state = serde_json::Map::new();
        for p in &self.peripherals {
            state.insert(p.name.clone(), p.dev.snapshot());
        }
        serde_json::Value::Object(state)
    }

    pub fn restore_peripherals(&mut self, state: &serde_json::Value) -> SimResult<()> {
        for p in &mut self.peripherals {
            if let Some(dev_state) = state.get(&p.name) {
                p.dev.restore(dev_state.clone())?;
            }
        }
        Ok(())
    }

    // A peripheral access forwards the window-local offset exactly once per
    // access, whatever the width; register dispatch ignores access size.
    fn peripheral_index_at(&self, addr: u64) -> Option<usize> {
        self.peripherals
            .iter()
            .position(|p| addr >= p.base && addr < p.base + p.size)
    }

    fn mem_read_u8(&self, addr: u64) -> Option<u8> {
        self.ram
            .read_u8(addr)
            .or_else(|| self.flash.read_u8(addr))
            .or_else(|| self.ahb_ram.as_ref().and_then(|m| m.read_u8(addr)))
    }

    fn mem_write_u8(&mut self, addr: u64, value: u8) -> bool {
        if self.ram.write_u8(addr, value) {
            return true;
        }
        if self.flash.write_u8(addr, value) {
            return true;
        }
        match &mut self.ahb_ram {
            Some(m) => m.write_u8(addr, value),
            None => false,
        }
    }

    fn mem_byte(&self, addr: u64) -> SimResult<u8> {
        self.mem_read_u8(addr)
            .ok_or(SimulationError::MemoryViolation(addr))
    }

    fn mem_put(&mut self, addr: u64, value: u8) -> SimResult<()> {
        if self.mem_write_u8(addr, value) {
            Ok(())
        } else {
            Err(SimulationError::MemoryViolation(addr))
        }
    }

    pub fn read_u8(&mut self, addr: u64) -> SimResult<u8> {
        if let Some(index) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[index];
            let value = entry.dev.read(addr - entry.base)?;
            return Ok((value & 0xFF) as u8);
        }
        self.mem_byte(addr)
    }

    pub fn read_u16(&mut self, addr: u64) -> SimResult<u16> {
        if let Some(index) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[index];
            let value = entry.dev.read(addr - entry.base)?;
            return Ok((value & 0xFFFF) as u16);
        }
        let b0 = self.mem_byte(addr)? as u16;
        let b1 = self.mem_byte(addr + 1)? as u16;
        // Little Endian
        Ok(b0 | (b1 << 8))
    }

    pub fn read_u32(&mut self, addr: u64) -> SimResult<u32> {
        if let Some(index) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[index];
            return entry.dev.read(addr - entry.base);
        }
        let b0 = self.mem_byte(addr)? as u32;
        let b1 = self.mem_byte(addr + 1)? as u32;
        let b2 = self.mem_byte(addr + 2)? as u32;
        let b3 = self.mem_byte(addr + 3)? as u32;
        Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()> {
        if let Some(index) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[index];
            return entry.dev.write(addr - entry.base, u32::from(value));
        }
        self.mem_put(addr, value)
    }

    pub fn write_u16(&mut self, addr: u64, value: u16) -> SimResult<()> {
        if let Some(index) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[index];
            return entry.dev.write(addr - entry.base, u32::from(value));
        }
        self.mem_put(addr, (value & 0xFF) as u8)?;
        self.mem_put(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        Ok(())
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        if let Some(index) = self.peripheral_index_at(addr) {
            let entry = &mut self.peripherals[index];
            return entry.dev.write(addr - entry.base, value);
        }
        self.mem_put(addr, (value & 0xFF) as u8)?;
        self.mem_put(addr + 1, ((value >> 8) & 0xFF) as u8)?;
        self.mem_put(addr + 2, ((value >> 16) & 0xFF) as u8)?;
        self.mem_put(addr + 3, ((value >> 24) & 0xFF) as u8)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bus_carries_stock_layout() {
        let mut bus = SystemBus::new();

        assert_eq!(bus.flash.base_addr, 0x0);
        assert_eq!(bus.ram.base_addr, 0x1000_0000);
        assert_eq!(bus.ahb_ram.as_ref().unwrap().base_addr, 0x2007_C000);

        // UART0 line status at its reset value through the bus.
        assert_eq!(bus.read_u32(0x4000_C014).unwrap(), 0x60);
        // PLL0STAT reports locked.
        assert_eq!(bus.read_u32(0x400F_C088).unwrap(), 0x7 << 24);
    }

    #[test]
    fn test_memory_words_compose_little_endian() {
        let mut bus = SystemBus::new();

        bus.write_u32(0x1000_0000, 0x1234_5678).unwrap();
        assert_eq!(bus.read_u8(0x1000_0000).unwrap(), 0x78);
        assert_eq!(bus.read_u8(0x1000_0003).unwrap(), 0x12);
        assert_eq!(bus.read_u16(0x1000_0002).unwrap(), 0x1234);
        assert_eq!(bus.read_u32(0x1000_0000).unwrap(), 0x1234_5678);

        bus.write_u16(0x2007_C000, 0xBEEF).unwrap();
        assert_eq!(bus.read_u32(0x2007_C000).unwrap(), 0x0000_BEEF);
    }

    #[test]
    fn test_unmapped_access_is_a_violation() {
        let mut bus = SystemBus::new();

        assert!(matches!(
            bus.read_u32(0xDEAD_0000),
            Err(SimulationError::MemoryViolation(0xDEAD_0000))
        ));
        assert!(matches!(
            bus.write_u8(0x4000_BFFF, 1),
            Err(SimulationError::MemoryViolation(_))
        ));
    }

    #[test]
    fn test_word_straddling_memory_end_is_a_violation() {
        let mut bus = SystemBus::new();

        // Last byte of main SRAM is fine, the next one is not.
        assert!(bus.write_u8(0x1000_7FFF, 0xAB).is_ok());
        assert!(matches!(
            bus.read_u32(0x1000_7FFD),
            Err(SimulationError::MemoryViolation(0x1000_8000))
        ));
    }
}
