// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signals::SystemClock;
use crate::SimResult;

const SYSC_PLL0CON: u64 = 0x080;
const SYSC_PLL0CFG: u64 = 0x084;
const SYSC_PLL0STAT: u64 = 0x088;
const SYSC_CCLKCFG: u64 = 0x104;
const SYSC_CLKSRCSEL: u64 = 0x10C;

/// PLL0 enabled, connected and locked.
const PLL0STAT_LOCKED: u32 = 0x7 << 24;

/// Frequency assumed when a clock source other than the internal RC
/// oscillator is selected.
const UNSUPPORTED_SOURCE_HZ: u64 = 100_000_000;

/// Internal RC oscillator frequency on stock parts.
pub const DEFAULT_MAIN_CLK_HZ: u32 = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockSource {
    InternalRc,
    MainOsc,
    Rtc,
    Invalid,
}

impl ClockSource {
    fn from_select(raw: u32) -> Self {
        match raw & 0x3 {
            0 => Self::InternalRc,
            1 => Self::MainOsc,
            2 => Self::Rtc,
            _ => Self::Invalid,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::InternalRc => "internal RC oscillator",
            Self::MainOsc => "main oscillator",
            Self::Rtc => "RTC oscillator",
            Self::Invalid => "(unknown clock source)",
        }
    }
}

/// LPC176x system control block, reduced to the clock generation registers.
///
/// Every successful store recomputes the CPU frequency and publishes it on
/// the shared [`SystemClock`]. Registers outside the modeled set read as
/// zero and ignore writes; that covers the PLL0FEED strobes at 0x08C.
#[derive(Debug, serde::Serialize)]
pub struct SysCon {
    main_clk_hz: u32,
    pll0con: u32,
    pll0cfg: u32,
    cclkcfg: u32,
    clksrcsel: u32,
    #[serde(skip)]
    clock: SystemClock,
}

impl SysCon {
    pub fn new(main_clk_hz: u32) -> Self {
        Self {
            main_clk_hz,
            pll0con: 0,
            pll0cfg: 0,
            cclkcfg: 0,
            clksrcsel: 0,
            clock: SystemClock::new(),
        }
    }

    /// Shared handle carrying the published CPU frequency.
    pub fn clock(&self) -> SystemClock {
        self.clock.clone()
    }

    fn read_reg(&self, offset: u64) -> u32 {
        match offset {
            SYSC_PLL0CON => self.pll0con,
            SYSC_PLL0CFG => self.pll0cfg,
            SYSC_PLL0STAT => PLL0STAT_LOCKED,
            SYSC_CCLKCFG => self.cclkcfg,
            SYSC_CLKSRCSEL => self.clksrcsel,
            _ => 0, // Unbacked offsets read as zero
        }
    }

    fn write_reg(&mut self, offset: u64, value: u32) {
        match offset {
            SYSC_PLL0CON => self.pll0con = value,
            SYSC_PLL0CFG => self.pll0cfg = value,
            SYSC_CCLKCFG => self.cclkcfg = value,
            SYSC_CLKSRCSEL => self.clksrcsel = value,
            _ => return, // Unbacked offsets ignore writes
        }
        self.update_clock();
    }

    /// PLL0 output: Fcco = (2 * M * Fin) / N, with M and N stored minus one.
    fn pll0_output_hz(&self) -> u64 {
        let m = u64::from(self.pll0cfg & 0xFFFF) + 1;
        let n = u64::from((self.pll0cfg >> 16) & 0xFFFF) + 1;
        2 * m * u64::from(self.main_clk_hz) / n
    }

    fn update_clock(&mut self) {
        let source = ClockSource::from_select(self.clksrcsel);
        if source != ClockSource::InternalRc {
            tracing::warn!(
                "syscon: unsupported clock source '{}' selected; assuming {} Hz",
                source.name(),
                UNSUPPORTED_SOURCE_HZ
            );
            self.clock.set_hz(UNSUPPORTED_SOURCE_HZ);
            return;
        }

        let cclk_div = u64::from(self.cclkcfg & 0xFF) + 1;
        let cpu_hz = self.pll0_output_hz() / cclk_div;
        tracing::debug!("syscon: cpu clock {} Hz", cpu_hz);
        self.clock.set_hz(cpu_hz);
    }
}

impl crate::Peripheral for SysCon {
    fn read(&mut self, offset: u64) -> SimResult<u32> {
        Ok(self.read_reg(offset))
    }

    fn write(&mut self, offset: u64, value: u32) -> SimResult<()> {
        tracing::trace!("syscon: write {:#05x} <- {:#010x}", offset, value);
        self.write_reg(offset, value);
        Ok(())
    }

    fn peek(&self, offset: u64) -> Option<u32> {
        Some(self.read_reg(offset))
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn restore(&mut self, state: serde_json::Value) -> SimResult<()> {
        if let Some(obj) = state.as_object() {
            if let Some(v) = obj.get("main_clk_hz").and_then(|v| v.as_u64()) {
                self.main_clk_hz = v as u32;
            }
            if let Some(v) = obj.get("pll0con").and_then(|v| v.as_u64()) {
                self.pll0con = v as u32;
            }
            if let Some(v) = obj.get("pll0cfg").and_then(|v| v.as_u64()) {
                self.pll0cfg = v as u32;
            }
            if let Some(v) = obj.get("cclkcfg").and_then(|v| v.as_u64()) {
                self.cclkcfg = v as u32;
            }
            if let Some(v) = obj.get("clksrcsel").and_then(|v| v.as_u64()) {
                self.clksrcsel = v as u32;
            }
        }
        self.update_clock();
        Ok(())
    }
}
