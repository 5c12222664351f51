// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the hub.
//!
//! - [`Uid`] - stable device identifier
//! - [`MacAddress`] - hardware address, rendered as colon-separated hex
//! - [`AddressRange`] - inclusive IPv4 range used to seed candidate addresses

mod address_range;
mod mac;
mod uid;

pub use address_range::AddressRange;
pub use mac::MacAddress;
pub use uid::Uid;
