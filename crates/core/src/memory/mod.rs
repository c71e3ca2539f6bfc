// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// A simple flat memory storage
#[derive(Debug)]
pub struct LinearMemory {
    pub data: Vec<u8>,
    pub base_addr: u64,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u64) -> Self {
        Self {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn read_u8(&self, addr: u64) -> Option<u8> {
        if addr >= self.base_addr && addr < self.base_addr + self.data.len() as u64 {
            Some(self.data[(addr - self.base_addr) as usize])
        } else {
            None
        }
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> bool {
        if addr >= self.base_addr && addr < self.base_addr + self.data.len() as u64 {
            self.data[(addr - self.base_addr) as usize] = value;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = LinearMemory::new(1024, 0x1000_0000);

        assert!(mem.write_u8(0x1000_0000, 0xAA));
        assert_eq!(mem.read_u8(0x1000_0000), Some(0xAA));

        // Last valid byte
        assert!(mem.write_u8(0x1000_03FF, 0x55));
        assert_eq!(mem.read_u8(0x1000_03FF), Some(0x55));
    }

    #[test]
    fn test_memory_out_of_bounds() {
        let mut mem = LinearMemory::new(1024, 0x1000_0000);

        assert_eq!(mem.read_u8(0x0FFF_FFFF), None);
        assert_eq!(mem.read_u8(0x1000_0400), None);
        assert!(!mem.write_u8(0x1000_0400, 0x01));
    }

    #[test]
    fn test_memory_starts_zeroed() {
        let mem = LinearMemory::new(16, 0x0);
        assert_eq!(mem.read_u8(0x0), Some(0));
        assert_eq!(mem.read_u8(0xF), Some(0));
    }
}
