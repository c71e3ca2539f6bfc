// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::SystemBus;
use crate::chardev::CharBackend;
use crate::peripherals::syscon::SysCon;
use crate::peripherals::uart::Uart;
use crate::signals::{IrqLine, SystemClock};

pub const FLASH_BASE: u64 = 0x0000_0000;
pub const FLASH_SIZE: usize = 512 * 1024;
pub const SRAM_BASE: u64 = 0x1000_0000;
pub const SRAM_SIZE: usize = 32 * 1024;
pub const AHB_SRAM_BASE: u64 = 0x2007_C000;
pub const AHB_SRAM_SIZE: usize = 32 * 1024;

pub const UART0_BASE: u64 = 0x4000_C000;
/// Exception number of UART0 (external interrupt line 5).
pub const UART0_IRQ: u32 = 21;
pub const SYSCON_BASE: u64 = 0x400F_C000;

/// Assembled LPC1768 board with the host-side handles cloned out.
pub struct Lpc1768System {
    pub bus: SystemBus,
    pub uart0_irq: IrqLine,
    pub clock: SystemClock,
}

/// Wires up the stock LPC1768 memory map with UART0 and the system control
/// block. The optional backend receives UART0 egress.
pub fn lpc1768(backend: Option<Box<dyn CharBackend>>) -> Lpc1768System {
    let mut bus = SystemBus::new();

    if let Some(backend) = backend {
        bus.attach_uart_backend("uart0", backend);
    }

    let uart0_irq = bus
        .device::<Uart>("uart0")
        .map(|uart| uart.irq_line())
        .unwrap_or_default();
    let clock = bus
        .device::<SysCon>("syscon")
        .map(|sysc| sysc.clock())
        .unwrap_or_default();

    Lpc1768System {
        bus,
        uart0_irq,
        clock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_handles_are_live() {
        let mut system = lpc1768(None);

        // Clock handle observes guest stores through the bus.
        system
            .bus
            .write_u32(SYSCON_BASE + 0x084, (0x0003 << 16) | 0x0009)
            .unwrap();
        system.bus.write_u32(SYSCON_BASE + 0x104, 0).unwrap();
        assert_eq!(system.clock.hz(), 20_000_000);

        // IRQ handle observes UART ingress.
        system.bus.write_u32(UART0_BASE + 0x04, 0x01).unwrap();
        let uart = system.bus.device_mut::<Uart>("uart0").unwrap();
        uart.receive(b'!');
        assert!(system.uart0_irq.take_pending());
    }
}
