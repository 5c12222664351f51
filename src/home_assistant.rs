// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Home Assistant configuration export.
//!
//! Renders live devices as a `switch:` block for Home Assistant's
//! `broadlink` platform.

use std::fmt::Write as _;

use crate::capabilities::DeviceClass;
use crate::device::PublicDevice;

/// Retry count written for every entry.
const RETRY: u32 = 10;

/// Renders a `switch:` block with one entry per device, sorted by address.
///
/// # Examples
///
/// ```ignore
/// let yaml = blhub::home_assistant::switch_config(&hub.devices());
/// assert!(yaml.starts_with("switch:\n"));
/// ```
#[must_use]
pub fn switch_config(devices: &[PublicDevice]) -> String {
    let mut sorted: Vec<&PublicDevice> = devices.iter().collect();
    sorted.sort_by_key(|device| device.address);

    let mut yaml = String::from("switch:\n");
    for device in sorted {
        push_entry(&mut yaml, device);
    }
    yaml
}

fn push_entry(yaml: &mut String, device: &PublicDevice) {
    let kind = match device.dev_class {
        DeviceClass::Sp3s => "sp3",
        _ => "sp2",
    };
    // writing to a String cannot fail
    let _ = writeln!(yaml, "  - platform: broadlink");
    let _ = writeln!(yaml, "    friendly_name: '{}'", quote(&device.name));
    let _ = writeln!(yaml, "    type: {kind}");
    let _ = writeln!(yaml, "    host: {}", device.address);
    let _ = writeln!(yaml, "    mac: '{}'", device.mac);
    let _ = writeln!(yaml, "    retry: {RETRY}");
}

/// Escapes a single-quoted YAML scalar and collapses whitespace runs.
fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out
}
