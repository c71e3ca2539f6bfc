// LPCSim - LPC1768 Peripheral Emulation
// Copyright (C) 2026 The LPCSim Authors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use lpcsim_config::ChipDescriptor;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_file(prefix: &str, contents: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("lpcsim-config-tests");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = dir.join(format!("{}-{}.yaml", prefix, nonce));
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

#[test]
fn test_descriptor_without_optional_fields_parses() {
    let yaml = r#"
name: "test-chip"
flash:
  base: 0x0
  size: "1MB"
ram:
  base: 0x20000000
  size: "128KB"
peripherals:
  - id: "uart1"
    type: "uart"
    base_address: 0x40013800
"#;
    let desc: ChipDescriptor = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(desc.peripherals.len(), 1);
    assert_eq!(desc.peripherals[0].id, "uart1");
    assert_eq!(desc.peripherals[0].size, None);
    assert_eq!(desc.peripherals[0].irq, None);
    assert!(desc.ahb_ram.is_none());
}

#[test]
fn test_window_and_irq_fields_parse() {
    let yaml = r#"
name: "test-chip"
flash:
  base: 0x0
  size: "1MB"
ram:
  base: 0x20000000
  size: "128KB"
peripherals:
  - id: "uart1"
    type: "uart"
    base_address: 0x40013800
    size: "1KB"
    irq: 37
"#;
    let desc: ChipDescriptor = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(desc.peripherals.len(), 1);
    assert_eq!(desc.peripherals[0].size, Some("1KB".to_string()));
    assert_eq!(desc.peripherals[0].irq, Some(37));
}

#[test]
fn test_from_file_roundtrip() {
    let path = write_temp_file(
        "lpc1768-shaped",
        r#"
schema_version: "1.0"
name: "lpc1768"
flash:
  base: 0x0
  size: "512KiB"
ram:
  base: 0x10000000
  size: "32KiB"
ahb_ram:
  base: 0x2007C000
  size: "32KiB"
peripherals:
  - id: "uart0"
    type: "uart"
    base_address: 0x4000C000
    irq: 21
  - id: "syscon"
    type: "syscon"
    base_address: 0x400FC000
    config:
      main_clk_hz: 4000000
"#,
    );

    let desc = ChipDescriptor::from_file(&path).unwrap();
    assert_eq!(desc.name, "lpc1768");
    assert_eq!(desc.flash.base, 0x0);
    assert_eq!(desc.ram.base, 0x10000000);
    assert_eq!(desc.ahb_ram.as_ref().unwrap().base, 0x2007C000);
    assert_eq!(desc.peripherals.len(), 2);
    assert_eq!(desc.peripherals[0].irq, Some(21));
    assert_eq!(desc.peripherals[1].r#type, "syscon");
}

#[test]
fn test_from_file_missing_path_reports_location() {
    let err = ChipDescriptor::from_file("/nonexistent/chip.yaml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/chip.yaml"));
}
