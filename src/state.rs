//! # State Oracle
//!
//! The engine's only window onto accounts and storage. [`StateOracle`] is a
//! synchronous trait so the instruction loop stays a pure function of its
//! inputs; the host decides where the data actually lives.
//!
//! Savepoints nest with call depth: the dispatcher opens one before every
//! child message and either commits it or rolls it back based on how the
//! child halted. [`InMemoryState`] implements the discipline with an undo
//! journal and is the backend used by the test suite.

use crate::errors::StateError;
use crate::types::{keccak256, Address, Bytes, Hash, StorageKey, StorageValue, U256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// =============================================================================
// ACCOUNT INFO
// =============================================================================

/// Balance, nonce, and code hash of an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountInfo {
    /// Balance in wei.
    pub balance: U256,
    /// Transaction/creation counter.
    pub nonce: u64,
    /// Keccak-256 of the deployed code.
    pub code_hash: Hash,
}

impl AccountInfo {
    /// True when the account would not survive state clearing: zero balance,
    /// zero nonce, no code.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.nonce == 0 && self.code_hash == keccak256(&[])
    }
}

// =============================================================================
// STATE ORACLE TRAIT
// =============================================================================

/// Host-provided account and storage backend.
///
/// All reads observe pending (uncommitted) writes of the current savepoint
/// chain. `original_storage` is the exception: it reports the value a slot
/// held when the outermost savepoint opened, which is what the SSTORE refund
/// rules meter against.
pub trait StateOracle {
    /// Loads an account, or `None` if it has never existed.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn get_account(&self, address: Address) -> Result<Option<AccountInfo>, StateError>;

    /// Loads deployed code; empty for absent accounts.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn get_code(&self, address: Address) -> Result<Arc<[u8]>, StateError>;

    /// Reads a storage slot; never-written slots read as zero.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn get_storage(&self, address: Address, key: StorageKey) -> Result<StorageValue, StateError>;

    /// Reads the value a slot held at the start of the outermost savepoint.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn original_storage(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, StateError>;

    /// Writes a storage slot.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn set_storage(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StateError>;

    /// Sets an account's balance, creating the account if needed.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn set_account_balance(&mut self, address: Address, balance: U256) -> Result<(), StateError>;

    /// Moves `value` wei between accounts. The caller must have verified the
    /// sender's balance; a short balance here is a backend inconsistency.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn move_ether(&mut self, from: Address, to: Address, value: U256) -> Result<(), StateError>;

    /// Bumps an account's nonce, creating the account if needed.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn increment_nonce(&mut self, address: Address) -> Result<(), StateError>;

    /// Installs deployed code at an address.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), StateError>;

    /// Schedules an account for destruction at the end of the transaction.
    /// Its code keeps running and its storage stays readable until then.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn destroy_account(&mut self, address: Address) -> Result<(), StateError>;

    /// Returns true when the account exists (has ever been created and not
    /// yet cleared).
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn account_exists(&self, address: Address) -> Result<bool, StateError>;

    /// Opens a savepoint. Nested calls stack.
    ///
    /// # Errors
    ///
    /// [`StateError`] when the backend fails.
    fn begin_transaction(&mut self) -> Result<(), StateError>;

    /// Merges the innermost savepoint into its parent. Committing the
    /// outermost savepoint finalizes scheduled destructions.
    ///
    /// # Errors
    ///
    /// [`StateError::MissingSavepoint`] with no open savepoint.
    fn commit_transaction(&mut self) -> Result<(), StateError>;

    /// Discards every write made since the innermost savepoint opened.
    ///
    /// # Errors
    ///
    /// [`StateError::MissingSavepoint`] with no open savepoint.
    fn rollback_transaction(&mut self) -> Result<(), StateError>;
}

// =============================================================================
// IN-MEMORY STATE
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
struct Account {
    balance: U256,
    nonce: u64,
    code: Arc<[u8]>,
}

impl Account {
    fn new() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code: Arc::from([].as_slice()),
        }
    }
}

/// One reversible state mutation.
#[derive(Clone, Debug)]
enum JournalEntry {
    Storage {
        address: Address,
        key: StorageKey,
        prev: Option<StorageValue>,
    },
    Account {
        address: Address,
        prev: Option<Account>,
    },
    Destroyed {
        address: Address,
    },
}

/// Journaled in-memory backend.
#[derive(Debug, Default)]
pub struct InMemoryState {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, StorageKey), StorageValue>,
    journal: Vec<JournalEntry>,
    savepoints: Vec<usize>,
    /// Slot values at the opening of the outermost savepoint, captured on
    /// first write.
    original: HashMap<(Address, StorageKey), StorageValue>,
    destroyed: HashSet<Address>,
}

impl InMemoryState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account with a balance (test and genesis setup).
    pub fn create_account(&mut self, address: Address, balance: U256) {
        let account = self.accounts.entry(address).or_insert_with(Account::new);
        account.balance = balance;
    }

    /// Seeds an account with balance and deployed code.
    pub fn create_contract(&mut self, address: Address, balance: U256, code: &[u8]) {
        let account = self.accounts.entry(address).or_insert_with(Account::new);
        account.balance = balance;
        account.nonce = 1;
        account.code = Arc::from(code);
    }

    /// Seeds a storage slot directly.
    pub fn seed_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.storage.insert((address, key), value);
    }

    /// Number of open savepoints (diagnostics).
    #[must_use]
    pub fn open_savepoints(&self) -> usize {
        self.savepoints.len()
    }

    fn in_transaction(&self) -> bool {
        !self.savepoints.is_empty()
    }

    fn journal_account(&mut self, address: Address) {
        if self.in_transaction() {
            self.journal.push(JournalEntry::Account {
                address,
                prev: self.accounts.get(&address).cloned(),
            });
        }
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::Storage { address, key, prev } => match prev {
                Some(value) => {
                    self.storage.insert((address, key), value);
                }
                None => {
                    self.storage.remove(&(address, key));
                }
            },
            JournalEntry::Account { address, prev } => match prev {
                Some(account) => {
                    self.accounts.insert(address, account);
                }
                None => {
                    self.accounts.remove(&address);
                }
            },
            JournalEntry::Destroyed { address } => {
                self.destroyed.remove(&address);
            }
        }
    }

    /// Wipes an account and all of its storage. Runs when the outermost
    /// savepoint commits with destructions scheduled.
    fn purge(&mut self, address: Address) {
        self.accounts.remove(&address);
        self.storage.retain(|(owner, _), _| *owner != address);
    }
}

impl StateOracle for InMemoryState {
    fn get_account(&self, address: Address) -> Result<Option<AccountInfo>, StateError> {
        Ok(self.accounts.get(&address).map(|account| AccountInfo {
            balance: account.balance,
            nonce: account.nonce,
            code_hash: keccak256(&account.code),
        }))
    }

    fn get_code(&self, address: Address) -> Result<Arc<[u8]>, StateError> {
        Ok(self
            .accounts
            .get(&address)
            .map(|account| Arc::clone(&account.code))
            .unwrap_or_else(|| Arc::from([].as_slice())))
    }

    fn get_storage(&self, address: Address, key: StorageKey) -> Result<StorageValue, StateError> {
        Ok(self
            .storage
            .get(&(address, key))
            .copied()
            .unwrap_or(StorageValue::ZERO))
    }

    fn original_storage(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, StateError> {
        if let Some(value) = self.original.get(&(address, key)) {
            return Ok(*value);
        }
        self.get_storage(address, key)
    }

    fn set_storage(
        &mut self,
        address: Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StateError> {
        let prev = self.storage.get(&(address, key)).copied();
        if self.in_transaction() {
            self.journal.push(JournalEntry::Storage { address, key, prev });
            self.original
                .entry((address, key))
                .or_insert_with(|| prev.unwrap_or(StorageValue::ZERO));
        }
        self.storage.insert((address, key), value);
        Ok(())
    }

    fn set_account_balance(&mut self, address: Address, balance: U256) -> Result<(), StateError> {
        self.journal_account(address);
        let account = self.accounts.entry(address).or_insert_with(Account::new);
        account.balance = balance;
        Ok(())
    }

    fn move_ether(&mut self, from: Address, to: Address, value: U256) -> Result<(), StateError> {
        if value.is_zero() {
            return Ok(());
        }
        let available = self
            .accounts
            .get(&from)
            .map(|account| account.balance)
            .unwrap_or_default();
        if available < value {
            return Err(StateError::Inconsistent(format!(
                "transfer of {value} from {from} with balance {available}"
            )));
        }
        self.journal_account(from);
        self.journal_account(to);
        if let Some(sender) = self.accounts.get_mut(&from) {
            sender.balance -= value;
        }
        let recipient = self.accounts.entry(to).or_insert_with(Account::new);
        recipient.balance += value;
        Ok(())
    }

    fn increment_nonce(&mut self, address: Address) -> Result<(), StateError> {
        self.journal_account(address);
        let account = self.accounts.entry(address).or_insert_with(Account::new);
        account.nonce += 1;
        Ok(())
    }

    fn set_code(&mut self, address: Address, code: Bytes) -> Result<(), StateError> {
        self.journal_account(address);
        let account = self.accounts.entry(address).or_insert_with(Account::new);
        account.code = Arc::from(code.as_slice());
        Ok(())
    }

    fn destroy_account(&mut self, address: Address) -> Result<(), StateError> {
        if self.destroyed.insert(address) && self.in_transaction() {
            self.journal.push(JournalEntry::Destroyed { address });
        }
        Ok(())
    }

    fn account_exists(&self, address: Address) -> Result<bool, StateError> {
        Ok(self.accounts.contains_key(&address))
    }

    fn begin_transaction(&mut self) -> Result<(), StateError> {
        self.savepoints.push(self.journal.len());
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<(), StateError> {
        self.savepoints.pop().ok_or(StateError::MissingSavepoint)?;
        if self.savepoints.is_empty() {
            self.journal.clear();
            self.original.clear();
            for address in std::mem::take(&mut self.destroyed) {
                self.purge(address);
            }
        }
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<(), StateError> {
        let mark = self.savepoints.pop().ok_or(StateError::MissingSavepoint)?;
        while self.journal.len() > mark {
            if let Some(entry) = self.journal.pop() {
                self.undo(entry);
            }
        }
        if self.savepoints.is_empty() {
            self.original.clear();
            self.destroyed.clear();
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
