// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct IrqLineInner {
    pending: AtomicBool,
    pulses: AtomicU64,
}

/// Edge-triggered interrupt line shared between a peripheral and the host.
///
/// The device pulses the line; the latch stays pending until the host side
/// consumes it with [`take_pending`](IrqLine::take_pending). Clones share the
/// same latch.
#[derive(Debug, Clone, Default)]
pub struct IrqLine {
    inner: Arc<IrqLineInner>,
}

impl IrqLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals one interrupt edge.
    pub fn pulse(&self) {
        self.inner.pending.store(true, Ordering::Relaxed);
        self.inner.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Consumes the latched edge.
    pub fn take_pending(&self) -> bool {
        self.inner.pending.swap(false, Ordering::Relaxed)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Relaxed)
    }

    /// Total edges since construction.
    pub fn pulse_count(&self) -> u64 {
        self.inner.pulses.load(Ordering::Relaxed)
    }
}

/// Shared CPU clock frequency handle.
///
/// The clock controller publishes into it whenever the guest reprograms the
/// clock tree. Reads 0 Hz until the first store.
#[derive(Debug, Clone, Default)]
pub struct SystemClock {
    hz: Arc<AtomicU64>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hz(&self, hz: u64) {
        self.hz.store(hz, Ordering::Relaxed);
    }

    pub fn hz(&self) -> u64 {
        self.hz.load(Ordering::Relaxed)
    }
}
