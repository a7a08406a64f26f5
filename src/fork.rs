//! # Fork Configuration
//!
//! Protocol upgrades change the gas schedule, the refund rules, and a
//! handful of behavioral edges. All of that variance is carried in a single
//! [`ForkConfig`] value injected into the executor, so the instruction
//! handlers never branch on a global fork flag.

use serde::{Deserialize, Serialize};

/// Protocol upgrade the engine executes under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Fork {
    /// Istanbul (pre-access-list gas schedule).
    Istanbul,
    /// Berlin (EIP-2929 warm/cold access costs).
    Berlin,
    /// London (EIP-1559 base fee, EIP-3529 refund cuts, EIP-3541).
    London,
    /// Paris (PREVRANDAO replaces DIFFICULTY).
    Paris,
    /// Shanghai (PUSH0, EIP-3860 init-code limits).
    #[default]
    Shanghai,
}

/// Gas schedule and behavioral switches for one fork.
///
/// Constructed once per block by the (out-of-scope) activation layer and
/// passed by reference into every execution.
#[derive(Clone, Debug)]
pub struct ForkConfig {
    /// Fork this schedule was derived from.
    pub fork: Fork,
    /// EIP-2929 warm/cold accounting enabled.
    pub has_access_lists: bool,
    /// PUSH0 is a defined opcode (EIP-3855).
    pub has_push0: bool,
    /// BASEFEE is a defined opcode (EIP-3198).
    pub has_base_fee: bool,
    /// Init code is size-limited and charged per word (EIP-3860).
    pub limit_init_code: bool,
    /// Deployed code may not begin with 0xEF (EIP-3541).
    pub reject_ef_code: bool,
    /// A REVERT inside init code returns the remaining gas to the creator.
    pub create_failure_returns_gas: bool,

    /// Surcharge for the first touch of a storage slot in a transaction.
    pub cold_sload_cost: u64,
    /// SLOAD cost once the slot is warm (also the SSTORE no-op/dirty cost).
    pub warm_sload_cost: u64,
    /// Surcharge for the first touch of an account in a transaction.
    pub cold_account_cost: u64,
    /// Account access cost once warm (flat cost pre-Berlin).
    pub warm_account_cost: u64,
    /// SSTORE cost for writing a non-zero value into an originally-zero slot.
    pub sstore_set_cost: u64,
    /// SSTORE cost for the first rewrite of an originally non-zero slot.
    pub sstore_reset_cost: u64,
    /// Refund granted for clearing a slot to zero.
    pub sstore_clear_refund: u64,
    /// SELFDESTRUCT refund (zero from London onward).
    pub selfdestruct_refund: u64,
    /// Divisor capping the total refund against gas used.
    pub refund_quotient: u64,

    /// Maximum deployed code size (EIP-170).
    pub max_code_size: usize,
    /// Maximum init code size (EIP-3860).
    pub max_init_code_size: usize,
    /// Maximum call/create nesting depth.
    pub max_call_depth: u16,
    /// Memory expansion ceiling in bytes.
    pub max_memory_size: usize,
}

impl ForkConfig {
    /// Builds the schedule for the given fork.
    #[must_use]
    pub fn new(fork: Fork) -> Self {
        let berlin = fork >= Fork::Berlin;
        let london = fork >= Fork::London;
        Self {
            fork,
            has_access_lists: berlin,
            has_push0: fork >= Fork::Shanghai,
            has_base_fee: london,
            limit_init_code: fork >= Fork::Shanghai,
            reject_ef_code: london,
            create_failure_returns_gas: true,
            cold_sload_cost: if berlin { 2_100 } else { 0 },
            warm_sload_cost: if berlin { 100 } else { 800 },
            cold_account_cost: if berlin { 2_600 } else { 0 },
            warm_account_cost: if berlin { 100 } else { 700 },
            sstore_set_cost: 20_000,
            sstore_reset_cost: if berlin { 2_900 } else { 5_000 },
            sstore_clear_refund: if london { 4_800 } else { 15_000 },
            selfdestruct_refund: if london { 0 } else { 24_000 },
            refund_quotient: if london { 5 } else { 2 },
            max_code_size: 24_576,
            max_init_code_size: 49_152,
            max_call_depth: 1_024,
            max_memory_size: 16 * 1024 * 1024,
        }
    }

    /// Shorthand for the latest supported schedule.
    #[must_use]
    pub fn shanghai() -> Self {
        Self::new(Fork::Shanghai)
    }

    /// SLOAD cost for the given warmth.
    #[must_use]
    pub fn sload_cost(&self, cold: bool) -> u64 {
        if self.has_access_lists && cold {
            self.cold_sload_cost
        } else {
            self.warm_sload_cost
        }
    }

    /// Account access cost (BALANCE, EXTCODE*, CALL-family target) for the
    /// given warmth.
    #[must_use]
    pub fn account_access_cost(&self, cold: bool) -> u64 {
        if self.has_access_lists && cold {
            self.cold_account_cost
        } else {
            self.warm_account_cost
        }
    }
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self::shanghai()
    }
}

// =============================================================================
// TESTS
// =============================================================================
