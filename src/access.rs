//! # Warm/Cold Access Tracking
//!
//! EIP-2929 access sets, scoped to a transaction. The first touch of an
//! address or storage slot is cold and pays the surcharge; later touches are
//! warm. The sets only ever grow: a reverted subcall keeps its entries warm,
//! which is the rule that makes the surcharge ungameable.

use crate::types::{Address, StorageKey};
use std::collections::HashSet;

/// Warmth of an address or slot at the moment of access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    /// First touch within the transaction.
    Cold,
    /// Touched before (or pre-warmed).
    Warm,
}

impl AccessStatus {
    /// Returns true for [`AccessStatus::Cold`].
    #[must_use]
    pub fn is_cold(self) -> bool {
        matches!(self, AccessStatus::Cold)
    }
}

/// Per-transaction warm sets for addresses and storage slots.
#[derive(Clone, Debug, Default)]
pub struct AccessSets {
    addresses: HashSet<Address>,
    slots: HashSet<(Address, StorageKey)>,
}

impl AccessSets {
    /// Creates empty sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an address warm without reporting a cold touch, as the
    /// transaction preamble does for origin, target, and precompiles.
    pub fn prewarm_address(&mut self, address: Address) {
        self.addresses.insert(address);
    }

    /// Marks a slot warm without reporting a cold touch (EIP-2930 access
    /// lists).
    pub fn prewarm_slot(&mut self, address: Address, key: StorageKey) {
        self.addresses.insert(address);
        self.slots.insert((address, key));
    }

    /// Touches an address, returning its warmth before the touch.
    pub fn touch_address(&mut self, address: Address) -> AccessStatus {
        if self.addresses.insert(address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    /// Touches a storage slot, returning its warmth before the touch.
    pub fn touch_slot(&mut self, address: Address, key: StorageKey) -> AccessStatus {
        if self.slots.insert((address, key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    /// Addresses touched so far.
    #[must_use]
    pub fn addresses(&self) -> &HashSet<Address> {
        &self.addresses
    }

    /// Slots touched so far.
    #[must_use]
    pub fn slots(&self) -> &HashSet<(Address, StorageKey)> {
        &self.slots
    }
}

// =============================================================================
// TESTS
// =============================================================================
