// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Address Registry.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use crate::types::Uid;

/// Candidate addresses and the device currently bound at each.
///
/// Each address holds at most one uid and a uid is bound to at most one
/// address: [`AddressRegistry::bind`] releases any previous binding of the
/// same uid.
#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    bindings: BTreeMap<Ipv4Addr, Option<Uid>>,
}

impl AddressRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unbound candidate address.
    ///
    /// Returns `false` and leaves the binding untouched if the address is
    /// already known.
    pub fn add_address(&mut self, address: Ipv4Addr) -> bool {
        if self.bindings.contains_key(&address) {
            return false;
        }
        self.bindings.insert(address, None);
        true
    }

    /// Returns `true` if the address is a known candidate.
    #[must_use]
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        self.bindings.contains_key(&address)
    }

    /// Binds `uid` at `address`, adding the address if needed.
    ///
    /// Any other address previously bound to `uid` becomes unbound.
    pub fn bind(&mut self, address: Ipv4Addr, uid: Uid) {
        for (other, bound) in &mut self.bindings {
            if *other != address && bound.as_ref() == Some(&uid) {
                *bound = None;
            }
        }
        self.bindings.insert(address, Some(uid));
    }

    /// Releases the binding at `address`, keeping it as a candidate.
    ///
    /// Returns the uid that was bound there.
    pub fn unbind(&mut self, address: Ipv4Addr) -> Option<Uid> {
        self.bindings.get_mut(&address).and_then(Option::take)
    }

    /// Returns the uid bound at `address`.
    #[must_use]
    pub fn bound_to(&self, address: Ipv4Addr) -> Option<&Uid> {
        self.bindings.get(&address).and_then(Option::as_ref)
    }

    /// Returns the address `uid` is bound at.
    #[must_use]
    pub fn address_of(&self, uid: &Uid) -> Option<Ipv4Addr> {
        self.bindings
            .iter()
            .find_map(|(address, bound)| (bound.as_ref() == Some(uid)).then_some(*address))
    }

    /// Iterates over every address and its binding, in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Addr, Option<&Uid>)> {
        self.bindings
            .iter()
            .map(|(address, bound)| (*address, bound.as_ref()))
    }

    /// Calls `f` for every address and its binding.
    pub fn for_each(&self, mut f: impl FnMut(Ipv4Addr, Option<&Uid>)) {
        for (address, uid) in self.iter() {
            f(address, uid);
        }
    }

    /// Returns the number of known addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if no address is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Extend<Ipv4Addr> for AddressRegistry {
    fn extend<I: IntoIterator<Item = Ipv4Addr>>(&mut self, addresses: I) {
        for address in addresses {
            self.add_address(address);
        }
    }
}

impl FromIterator<Ipv4Addr> for AddressRegistry {
    fn from_iter<I: IntoIterator<Item = Ipv4Addr>>(addresses: I) -> Self {
        let mut registry = Self::new();
        registry.extend(addresses);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
    const B: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

    #[test]
    fn add_address_is_idempotent() {
        let mut registry = AddressRegistry::new();
        assert!(registry.add_address(A));
        registry.bind(A, Uid::from("x"));

        assert!(!registry.add_address(A));
        assert_eq!(registry.bound_to(A), Some(&Uid::from("x")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unbind_keeps_candidate() {
        let mut registry: AddressRegistry = [A].into_iter().collect();
        registry.bind(A, Uid::from("x"));

        assert_eq!(registry.unbind(A), Some(Uid::from("x")));
        assert!(registry.contains(A));
        assert_eq!(registry.bound_to(A), None);
        assert_eq!(registry.unbind(A), None);
    }

    #[test]
    fn bind_moves_uid_between_addresses() {
        let mut registry: AddressRegistry = [A, B].into_iter().collect();
        let uid = Uid::from("x");
        registry.bind(A, uid.clone());
        registry.bind(B, uid.clone());

        assert_eq!(registry.bound_to(A), None);
        assert_eq!(registry.bound_to(B), Some(&uid));
        assert_eq!(registry.address_of(&uid), Some(B));
    }

    #[test]
    fn for_each_visits_every_address() {
        let mut registry: AddressRegistry = [B, A].into_iter().collect();
        registry.bind(B, Uid::from("y"));

        let mut seen = Vec::new();
        registry.for_each(|address, uid| seen.push((address, uid.cloned())));
        assert_eq!(seen, vec![(A, None), (B, Some(Uid::from("y")))]);
    }
}
