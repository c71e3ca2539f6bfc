// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod syscon;
pub mod uart;
