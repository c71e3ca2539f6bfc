// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Connection state changes reported by a byte-stream transport.
///
/// The UART model ignores these; the variants exist so hosts with real
/// transports (pty, socket) can forward their lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChardevEvent {
    Opened,
    Closed,
}

/// Consumer side of a UART byte stream.
pub trait CharBackend: fmt::Debug + Send {
    fn transmit(&mut self, byte: u8);
}

/// Captures transmitted bytes into a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureBackend {
    data: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl CharBackend for CaptureBackend {
    fn transmit(&mut self, byte: u8) {
        if let Ok(mut guard) = self.data.lock() {
            guard.push(byte);
        }
    }
}

/// Echoes transmitted bytes to the host terminal.
#[derive(Debug, Default)]
pub struct StdoutBackend;

impl CharBackend for StdoutBackend {
    fn transmit(&mut self, byte: u8) {
        #[allow(unused_must_use)]
        {
            print!("{}", byte as char);
            io::stdout().flush();
        }
    }
}
