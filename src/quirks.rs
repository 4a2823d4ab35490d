//! Vendor quirk filter.
//!
//! Some wheel bases emit spurious reports:
//! - a report whose only active usage is a fixed sentinel code,
//! - one empty report right after real button activity.
//!
//! Each affected device (by resolved display name) gets its own small state
//! machine so several of them can be connected at once.

use std::collections::{HashMap, HashSet};

/// Sentinel usage the affected wheel bases report on their own.
pub const DEFAULT_SENTINEL_USAGE: u16 = 1;
/// Display name of the known affected device.
pub const SIMUCUBE_2_PRO: &str = "Simucube 2 Pro";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuirkState {
    #[default]
    Idle,
    ActivityObserved,
}

/// Per-report verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuirkVerdict {
    Pass,
    DropSentinel,
    DropGlitch,
}

#[derive(Clone, Debug)]
pub struct QuirkFilter {
    devices: HashSet<String>,
    sentinel: u16,
    states: HashMap<String, QuirkState>,
}

impl QuirkFilter {
    pub fn new<I, S>(devices: I, sentinel: u16) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: devices.into_iter().map(Into::into).collect(),
            sentinel,
            states: HashMap::new(),
        }
    }

    pub fn applies_to(&self, device_name: &str) -> bool {
        self.devices.contains(device_name)
    }

    pub fn state(&self, device_name: &str) -> QuirkState {
        self.states.get(device_name).copied().unwrap_or_default()
    }

    /// Judge one decoded usage list and advance the device's state.
    pub fn filter(&mut self, device_name: &str, usages: &[u16]) -> QuirkVerdict {
        if !self.applies_to(device_name) {
            return QuirkVerdict::Pass;
        }

        if usages == [self.sentinel] {
            return QuirkVerdict::DropSentinel;
        }

        let state = self.states.entry(device_name.to_string()).or_default();
        match (usages.is_empty(), *state) {
            (false, _) => {
                *state = QuirkState::ActivityObserved;
                QuirkVerdict::Pass
            }
            (true, QuirkState::ActivityObserved) => {
                *state = QuirkState::Idle;
                QuirkVerdict::DropGlitch
            }
            (true, QuirkState::Idle) => QuirkVerdict::Pass,
        }
    }

    pub fn reset(&mut self) {
        self.states.clear();
    }
}

impl Default for QuirkFilter {
    fn default() -> Self {
        Self::new([SIMUCUBE_2_PRO], DEFAULT_SENTINEL_USAGE)
    }
}
