// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber session identifier.

use std::fmt;

use uuid::Uuid;

/// Unique identifier of a subscriber session, used to correlate log lines.
///
/// # Examples
///
/// ```
/// use blhub::subscription::SessionId;
///
/// let a = SessionId::new();
/// let b = SessionId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.simple().to_string()[..8];
        write!(f, "SessionId({short}...)")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_shortened() {
        let id = SessionId::from(Uuid::nil());
        assert_eq!(format!("{id:?}"), "SessionId(00000000...)");
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn round_trips_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(SessionId::from(uuid).as_uuid(), uuid);
    }
}
