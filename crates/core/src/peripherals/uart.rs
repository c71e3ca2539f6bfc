// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::chardev::{CharBackend, ChardevEvent};
use crate::signals::IrqLine;
use crate::{Access, SimResult, SimulationError};
use bitflags::bitflags;

const UART_RBR_THR_DLL: u64 = 0x00;
const UART_IER_DLM: u64 = 0x04;
const UART_IIR_FCR: u64 = 0x08;
const UART_LCR: u64 = 0x0C;
const UART_LSR: u64 = 0x14;

/// Divisor-latch access bit in LCR.
const LCR_DLAB: u32 = 1 << 7;

bitflags! {
    /// Interrupt enable register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntEnable: u32 {
        /// Receive data available.
        const RX_AVAIL = 1 << 0;
        /// Transmit holding register empty.
        const THR_EMPTY = 1 << 1;
    }
}

bitflags! {
    /// Interrupt identification register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IntIdent: u32 {
        /// No interrupt pending. Cleared while a cause is latched.
        const NONE_PENDING = 1 << 0;
        /// Transmit holding register empty is the latched cause.
        const THR_EMPTY = 1 << 1;
        /// Receive data available is the latched cause.
        const RX_AVAIL = 2 << 1;
    }
}

bitflags! {
    /// Line status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineStatus: u32 {
        /// A received byte is waiting in the receive buffer.
        const RX_READY = 1 << 0;
        /// Transmit holding register empty. Reads always report it set.
        const THR_EMPTY = 1 << 5;
        /// Transmitter idle.
        const TX_IDLE = 1 << 6;
    }
}

/// 16550-style UART from the LPC176x family, mapped as 32-bit registers.
///
/// Offsets 0x00 and 0x04 alias the divisor latches with the data and
/// interrupt-enable registers, selected by LCR bit 7. Modem control (0x10),
/// modem status (0x18) and scratch (0x1C) are not modeled; touching them is
/// treated as a guest programming error and fails the access.
#[derive(Debug)]
pub struct Uart {
    dll: u32,
    dlm: u32,
    ier: IntEnable,
    iir: IntIdent,
    fcr: u32,
    lcr: u32,
    lsr: LineStatus,
    rx_byte: u8,
    irq: IrqLine,
    backend: Option<Box<dyn CharBackend>>,
}

impl Uart {
    pub fn new() -> Self {
        let mut uart = Self {
            dll: 0,
            dlm: 0,
            ier: IntEnable::empty(),
            iir: IntIdent::empty(),
            fcr: 0,
            lcr: 0,
            lsr: LineStatus::empty(),
            rx_byte: 0,
            irq: IrqLine::new(),
            backend: None,
        };
        uart.reset_registers();
        uart
    }

    fn reset_registers(&mut self) {
        self.dll = 0x01; // Divisor of 1 so a zero divisor never escapes reset
        self.dlm = 0;
        self.ier = IntEnable::empty();
        self.iir = IntIdent::NONE_PENDING;
        self.fcr = 0;
        self.lcr = 0;
        self.lsr = LineStatus::THR_EMPTY | LineStatus::TX_IDLE;
        self.rx_byte = 0;
    }

    fn dlab(&self) -> bool {
        self.lcr & LCR_DLAB != 0
    }

    /// Shared handle to this UART's interrupt output.
    pub fn irq_line(&self) -> IrqLine {
        self.irq.clone()
    }

    pub fn attach_backend(&mut self, backend: Box<dyn CharBackend>) {
        self.backend = Some(backend);
    }

    /// True while the single-byte receive buffer is free.
    pub fn can_receive(&self) -> bool {
        !self.lsr.contains(LineStatus::RX_READY)
    }

    /// Delivers one byte from the host side into the receive buffer.
    pub fn receive(&mut self, byte: u8) {
        self.rx_byte = byte;
        self.lsr.insert(LineStatus::RX_READY);
        self.iir.insert(IntIdent::RX_AVAIL);
        self.iir.remove(IntIdent::NONE_PENDING);
        self.update_irq();
    }

    /// Connection events from the transport are ignored.
    pub fn backend_event(&mut self, _event: ChardevEvent) {}

    fn transmit(&mut self, byte: u8) {
        if let Some(backend) = &mut self.backend {
            backend.transmit(byte);
        }
    }

    fn update_irq(&mut self) {
        let rx_pending = self.ier.contains(IntEnable::RX_AVAIL)
            && self.iir.contains(IntIdent::RX_AVAIL);
        let tx_pending = self.ier.contains(IntEnable::THR_EMPTY)
            && self.iir.contains(IntIdent::THR_EMPTY);

        if rx_pending || tx_pending {
            tracing::debug!("uart: irq pulse (iir={:#04x})", self.iir.bits());
            self.irq.pulse();
        }
    }
}

impl Default for Uart {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::Peripheral for Uart {
    fn read(&mut self, offset: u64) -> SimResult<u32> {
        let value = match offset {
            UART_RBR_THR_DLL => {
                if self.dlab() {
                    // Divisor-low readback is not modeled; guests get zero.
                    0
                } else {
                    self.lsr.remove(LineStatus::RX_READY);
                    self.iir.remove(IntIdent::RX_AVAIL);
                    u32::from(self.rx_byte)
                }
            }
            UART_IER_DLM => {
                if self.dlab() {
                    self.dlm
                } else {
                    self.ier.bits()
                }
            }
            UART_IIR_FCR => {
                let pending = self.iir.bits();
                self.iir = IntIdent::NONE_PENDING;
                pending
            }
            UART_LSR => (self.lsr | LineStatus::THR_EMPTY).bits(),
            _ => {
                return Err(SimulationError::UnsupportedOffset {
                    device: "uart",
                    access: Access::Read,
                    offset,
                })
            }
        };
        tracing::trace!("uart: read {:#04x} -> {:#010x}", offset, value);
        Ok(value)
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        tracing::trace!("uart: write {:#04x} <- {:#010x}", offset, value);
        match offset {
            UART_RBR_THR_DLL => {
                if self.dlab() {
                    self.dll = value;
                } else {
                    self.transmit(value as u8);
                    // Raise then retire the transmit cause; only the
                    // no-pending bit stays cleared afterwards.
                    self.iir.insert(IntIdent::THR_EMPTY);
                    self.iir.remove(IntIdent::NONE_PENDING);
                    self.iir.remove(IntIdent::THR_EMPTY);
                    self.update_irq();
                }
            }
            UART_IER_DLM => {
                if self.dlab() {
                    self.dlm = value;
                } else {
                    self.ier = IntEnable::from_bits_retain(value);
                }
            }
            UART_IIR_FCR => self.fcr = value,
            UART_LCR => self.lcr = value,
            _ => {
                return Err(SimulationError::UnsupportedOffset {
                    device: "uart",
                    access: Access::Write,
                    offset,
                })
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.reset_registers();
    }

    fn peek(&self, offset: u64) -> Option<u32> {
        match offset {
            UART_RBR_THR_DLL if !self.dlab() => Some(u32::from(self.rx_byte)),
            UART_IER_DLM => Some(if self.dlab() { self.dlm } else { self.ier.bits() }),
            UART_IIR_FCR => Some(self.iir.bits()),
            UART_LSR => Some((self.lsr | LineStatus::THR_EMPTY).bits()),
            _ => None,
        }
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "dll": self.dll,
            "dlm": self.dlm,
            "ier": self.ier.bits(),
            "iir": self.iir.bits(),
            "fcr": self.fcr,
            "lcr": self.lcr,
            "lsr": self.lsr.bits(),
            "rx_byte": self.rx_byte,
        })
    }

    fn restore(&mut self, state: serde_json::Value) -> SimResult<()> {
        if let Some(obj) = state.as_object() {
            if let Some(v) = obj.get("dll").and_then(|v| v.as_u64()) {
                self.dll = v as u32;
            }
            if let Some(v) = obj.get("dlm").and_then(|v| v.as_u64()) {
                self.dlm = v as u32;
            }
            if let Some(v) = obj.get("ier").and_then(|v| v.as_u64()) {
                self.ier = IntEnable::from_bits_retain(v as u32);
            }
            if let Some(v) = obj.get("iir").and_then(|v| v.as_u64()) {
                self.iir = IntIdent::from_bits_retain(v as u32);
            }
            if let Some(v) = obj.get("fcr").and_then(|v| v.as_u64()) {
                self.fcr = v as u32;
            }
            if let Some(v) = obj.get("lcr").and_then(|v| v.as_u64()) {
                self.lcr = v as u32;
            }
            if let Some(v) = obj.get("lsr").and_then(|v| v.as_u64()) {
                self.lsr = LineStatus::from_bits_retain(v as u32);
            }
            if let Some(v) = obj.get("rx_byte").and_then(|v| v.as_u64()) {
                self.rx_byte = v as u8;
            }
        }
        Ok(())
    }
}
