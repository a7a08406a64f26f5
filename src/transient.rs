//! # Transient Storage
//!
//! EIP-1153 transient storage: per-transaction slots that follow the same
//! savepoint discipline as persistent storage but never touch the state
//! oracle and vanish when the transaction ends. TLOAD/TSTORE pay a flat
//! warm cost and no refunds apply.

use crate::types::{Address, StorageKey, StorageValue};
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct WriteRecord {
    address: Address,
    key: StorageKey,
    prev: Option<StorageValue>,
}

/// Journaled transient slot map, scoped to one transaction.
#[derive(Clone, Debug, Default)]
pub struct TransientStorage {
    slots: HashMap<(Address, StorageKey), StorageValue>,
    journal: Vec<WriteRecord>,
    savepoints: Vec<usize>,
}

impl TransientStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TLOAD: never-written slots read as zero.
    #[must_use]
    pub fn load(&self, address: Address, key: StorageKey) -> StorageValue {
        self.slots
            .get(&(address, key))
            .copied()
            .unwrap_or(StorageValue::ZERO)
    }

    /// TSTORE.
    pub fn store(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        let prev = self.slots.get(&(address, key)).copied();
        self.journal.push(WriteRecord { address, key, prev });
        self.slots.insert((address, key), value);
    }

    /// Opens a savepoint, mirroring the state oracle's.
    pub fn begin(&mut self) {
        self.savepoints.push(self.journal.len());
    }

    /// Merges the innermost savepoint into its parent.
    pub fn commit(&mut self) {
        self.savepoints.pop();
        if self.savepoints.is_empty() {
            self.journal.clear();
        }
    }

    /// Discards writes made since the innermost savepoint opened.
    pub fn revert(&mut self) {
        let mark = self.savepoints.pop().unwrap_or(0);
        while self.journal.len() > mark {
            if let Some(record) = self.journal.pop() {
                match record.prev {
                    Some(value) => {
                        self.slots.insert((record.address, record.key), value);
                    }
                    None => {
                        self.slots.remove(&(record.address, record.key));
                    }
                }
            }
        }
    }

    /// Drops everything at transaction end.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.journal.clear();
        self.savepoints.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::U256;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn key(word: u64) -> StorageKey {
        StorageKey::from_word(U256::from(word))
    }

    fn value(word: u64) -> StorageValue {
        StorageValue::from_word(U256::from(word))
    }

    #[test]
    fn test_unwritten_reads_zero() {
        let store = TransientStorage::new();
        assert_eq!(store.load(addr(1), key(0)), StorageValue::ZERO);
    }

    #[test]
    fn test_revert_restores_prior_value() {
        let mut store = TransientStorage::new();
        store.begin();
        store.store(addr(1), key(0), value(5));

        store.begin();
        store.store(addr(1), key(0), value(9));
        assert_eq!(store.load(addr(1), key(0)), value(9));
        store.revert();

        assert_eq!(store.load(addr(1), key(0)), value(5));
        store.commit();
    }

    #[test]
    fn test_commit_survives_into_parent() {
        let mut store = TransientStorage::new();
        store.begin();
        store.begin();
        store.store(addr(1), key(0), value(3));
        store.commit();
        assert_eq!(store.load(addr(1), key(0)), value(3));
        store.revert();
        assert_eq!(store.load(addr(1), key(0)), StorageValue::ZERO);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut store = TransientStorage::new();
        store.begin();
        store.store(addr(1), key(0), value(1));
        store.clear();
        assert_eq!(store.load(addr(1), key(0)), StorageValue::ZERO);
    }
}
