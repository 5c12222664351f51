// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a device.
///
/// The identifier is derived by the Device Transport from the device's
/// identity (not its address), so it survives address changes. It is a
/// distinct type to keep it from being confused with other strings such as
/// names or addresses.
///
/// # Examples
///
/// ```
/// use blhub::types::Uid;
///
/// let uid = Uid::from("34ea34b4c2f1");
/// assert_eq!(uid.as_str(), "34ea34b4c2f1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    /// Creates an identifier from its string form.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(uid: &str) -> Self {
        Self(uid.to_string())
    }
}

impl From<String> for Uid {
    fn from(uid: String) -> Self {
        Self(uid)
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality() {
        assert_eq!(Uid::from("abc"), Uid::new(String::from("abc")));
        assert_ne!(Uid::from("abc"), Uid::from("abd"));
    }

    #[test]
    fn display_format() {
        assert_eq!(Uid::from("34ea34b4c2f1").to_string(), "34ea34b4c2f1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Uid::from("x1")).unwrap();
        assert_eq!(json, "\"x1\"");
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Uid::from("a"));
        assert!(set.contains(&Uid::from("a")));
    }
}
