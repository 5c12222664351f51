// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Single-flight scheduling of reconciliation cycles.

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Scheduling state of the reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightState {
    /// Waiting for the interval to elapse or for a trigger.
    Idle,
    /// Idle, with a cycle requested to start as soon as possible.
    Requested,
    /// A cycle is executing.
    Running,
    /// A cycle is executing and this many triggers arrived meanwhile.
    RerunPending(u32),
}

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The idle loop was woken to start a cycle now.
    Started,
    /// A cycle is in flight; the request was folded into one rerun.
    Coalesced,
}

/// Single-flight gate: at most one cycle runs, extra triggers coalesce.
///
/// Transitions:
///
/// | state | `trigger()` | `finish()` |
/// |---|---|---|
/// | `Idle` | `Requested`, wake loop | n/a |
/// | `Requested` | unchanged | n/a |
/// | `Running` | `RerunPending(1)` | `Idle`, no rerun |
/// | `RerunPending(n)` | `RerunPending(n + 1)` | stays, rerun |
///
/// `begin()` moves any state to `Running`, consuming a pending request and
/// discarding the pending count. A cycle that starts on the interval thus
/// absorbs a trigger that raced with it.
#[derive(Debug)]
pub struct SingleFlight {
    state: Mutex<FlightState>,
    wake: Notify,
}

impl SingleFlight {
    /// Creates an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Idle),
            wake: Notify::new(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> FlightState {
        *self.state.lock()
    }

    /// Requests a cycle as soon as possible.
    pub fn trigger(&self) -> Trigger {
        let mut state = self.state.lock();
        match *state {
            FlightState::Idle => {
                *state = FlightState::Requested;
                self.wake.notify_one();
                Trigger::Started
            }
            FlightState::Requested => Trigger::Started,
            FlightState::Running => {
                *state = FlightState::RerunPending(1);
                Trigger::Coalesced
            }
            FlightState::RerunPending(n) => {
                *state = FlightState::RerunPending(n.saturating_add(1));
                Trigger::Coalesced
            }
        }
    }

    /// Marks the start of a cycle.
    pub fn begin(&self) {
        *self.state.lock() = FlightState::Running;
    }

    /// Marks the end of a cycle and returns whether a rerun is owed.
    ///
    /// Without a pending rerun the gate goes idle. With one it stays in
    /// `RerunPending` until the next [`SingleFlight::begin`], so triggers
    /// during the rerun delay fold into that rerun.
    pub fn finish(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            FlightState::RerunPending(_) => true,
            FlightState::Requested => false,
            FlightState::Idle | FlightState::Running => {
                *state = FlightState::Idle;
                false
            }
        }
    }

    /// Waits until a cycle has been requested.
    ///
    /// Returns at once if a request is already pending. Wake-ups left over
    /// from a request that a cycle has since consumed are ignored.
    pub async fn triggered(&self) {
        loop {
            if self.state() == FlightState::Requested {
                return;
            }
            self.wake.notified().await;
        }
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}
