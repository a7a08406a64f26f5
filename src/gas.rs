//! # Gas Metering
//!
//! Cost constants, the per-opcode base cost table, dynamic cost helpers, and
//! the [`GasMeter`] owned by each frame. Every charge happens strictly before
//! the side effect it pays for, so an OutOfGas halt can never interrupt a
//! half-applied mutation.

use crate::errors::VmError;
use crate::types::U256;

// =============================================================================
// COST CONSTANTS
// =============================================================================

/// Static gas costs shared by the base table and the dynamic helpers.
pub mod costs {
    /// Cheapest tier (ADDRESS, CALLER, POP, ...).
    pub const BASE: u64 = 2;
    /// ADD/SUB/NOT/LT tier, also PUSH/DUP/SWAP.
    pub const VERY_LOW: u64 = 3;
    /// MUL/DIV/MOD tier.
    pub const LOW: u64 = 5;
    /// ADDMOD/MULMOD tier.
    pub const MID: u64 = 8;
    /// JUMPI.
    pub const HIGH: u64 = 10;
    /// JUMPDEST marker.
    pub const JUMPDEST: u64 = 1;

    /// KECCAK256 base.
    pub const KECCAK256: u64 = 30;
    /// KECCAK256 per input word.
    pub const KECCAK256_WORD: u64 = 6;
    /// Per-word cost of the copy family (CALLDATACOPY, CODECOPY, ...).
    pub const COPY_WORD: u64 = 3;

    /// EXP base.
    pub const EXP: u64 = 10;
    /// EXP per byte of exponent magnitude.
    pub const EXP_BYTE: u64 = 50;

    /// LOGn base.
    pub const LOG: u64 = 375;
    /// LOGn per topic.
    pub const LOG_TOPIC: u64 = 375;
    /// LOGn per byte of payload.
    pub const LOG_DATA: u64 = 8;

    /// BLOCKHASH.
    pub const BLOCKHASH: u64 = 20;

    /// Surcharge for a value-bearing CALL.
    pub const CALL_VALUE: u64 = 9_000;
    /// Surcharge for calling into a non-existent account with value.
    pub const CALL_NEW_ACCOUNT: u64 = 25_000;
    /// Gas granted to the callee of a value-bearing CALL on top of the
    /// forwarded amount.
    pub const CALL_STIPEND: u64 = 2_300;

    /// CREATE/CREATE2 base.
    pub const CREATE: u64 = 32_000;
    /// Per byte of code deposited by a successful create.
    pub const CODE_DEPOSIT_BYTE: u64 = 200;
    /// EIP-3860 per-word charge on init code.
    pub const INIT_CODE_WORD: u64 = 2;

    /// SELFDESTRUCT base.
    pub const SELFDESTRUCT: u64 = 5_000;
    /// SELFDESTRUCT surcharge when the beneficiary must be created.
    pub const SELFDESTRUCT_NEW_ACCOUNT: u64 = 25_000;

    /// EIP-2200 sentry: SSTORE refuses to run with this much gas or less.
    pub const SSTORE_SENTRY: u64 = 2_300;

    /// Per-word coefficient of the memory cost polynomial.
    pub const MEMORY_WORD: u64 = 3;
}

// =============================================================================
// BASE COST TABLE
// =============================================================================

/// Static base cost per opcode byte, charged at fetch time. Dynamic
/// components (memory expansion, warmth, input-size terms) are charged by
/// the individual handlers on top; opcodes whose cost is entirely dynamic
/// carry zero here.
#[rustfmt::skip]
pub const BASE_GAS: [u64; 256] = {
    let mut table = [0u64; 256];

    // Stop and arithmetic.
    table[0x01] = costs::VERY_LOW;  // ADD
    table[0x02] = costs::LOW;       // MUL
    table[0x03] = costs::VERY_LOW;  // SUB
    table[0x04] = costs::LOW;       // DIV
    table[0x05] = costs::LOW;       // SDIV
    table[0x06] = costs::LOW;       // MOD
    table[0x07] = costs::LOW;       // SMOD
    table[0x08] = costs::MID;       // ADDMOD
    table[0x09] = costs::MID;       // MULMOD
    table[0x0A] = costs::EXP;       // EXP (dynamic added)
    table[0x0B] = costs::LOW;       // SIGNEXTEND

    // Comparison and bitwise.
    let mut i = 0x10;
    while i <= 0x1D {
        table[i] = costs::VERY_LOW; // LT..SAR
        i += 1;
    }

    table[0x20] = costs::KECCAK256; // KECCAK256 (dynamic added)

    // Environment.
    table[0x30] = costs::BASE;      // ADDRESS
    table[0x32] = costs::BASE;      // ORIGIN
    table[0x33] = costs::BASE;      // CALLER
    table[0x34] = costs::BASE;      // CALLVALUE
    table[0x35] = costs::VERY_LOW;  // CALLDATALOAD
    table[0x36] = costs::BASE;      // CALLDATASIZE
    table[0x37] = costs::VERY_LOW;  // CALLDATACOPY (dynamic added)
    table[0x38] = costs::BASE;      // CODESIZE
    table[0x39] = costs::VERY_LOW;  // CODECOPY (dynamic added)
    table[0x3A] = costs::BASE;      // GASPRICE
    table[0x3D] = costs::BASE;      // RETURNDATASIZE
    table[0x3E] = costs::VERY_LOW;  // RETURNDATACOPY (dynamic added)
    // BALANCE, EXTCODESIZE/COPY/HASH (0x31, 0x3B, 0x3C, 0x3F) are fully
    // warmth-dependent.

    // Block information.
    table[0x40] = costs::BLOCKHASH; // BLOCKHASH
    table[0x41] = costs::BASE;      // COINBASE
    table[0x42] = costs::BASE;      // TIMESTAMP
    table[0x43] = costs::BASE;      // NUMBER
    table[0x44] = costs::BASE;      // PREVRANDAO
    table[0x45] = costs::BASE;      // GASLIMIT
    table[0x46] = costs::BASE;      // CHAINID
    table[0x47] = costs::LOW;       // SELFBALANCE
    table[0x48] = costs::BASE;      // BASEFEE

    // Stack, memory, storage, flow.
    table[0x50] = costs::BASE;      // POP
    table[0x51] = costs::VERY_LOW;  // MLOAD (dynamic added)
    table[0x52] = costs::VERY_LOW;  // MSTORE (dynamic added)
    table[0x53] = costs::VERY_LOW;  // MSTORE8 (dynamic added)
    table[0x56] = costs::MID;       // JUMP
    table[0x57] = costs::HIGH;      // JUMPI
    table[0x58] = costs::BASE;      // PC
    table[0x59] = costs::BASE;      // MSIZE
    table[0x5A] = costs::BASE;      // GAS
    table[0x5B] = costs::JUMPDEST;  // JUMPDEST
    table[0x5C] = 100;              // TLOAD (EIP-1153, warm cost)
    table[0x5D] = 100;              // TSTORE
    table[0x5E] = costs::VERY_LOW;  // MCOPY (dynamic added)
    // SLOAD/SSTORE (0x54, 0x55) are fully warmth-dependent.

    // PUSH0..PUSH32, DUP1..16, SWAP1..16.
    table[0x5F] = costs::BASE;
    i = 0x60;
    while i <= 0x9F {
        table[i] = costs::VERY_LOW;
        i += 1;
    }

    // LOG0..LOG4 (topic/data terms dynamic).
    i = 0xA0;
    while i <= 0xA4 {
        table[i] = costs::LOG;
        i += 1;
    }

    // System.
    table[0xF0] = costs::CREATE;    // CREATE (init-code word cost dynamic)
    table[0xF5] = costs::CREATE;    // CREATE2 (hash + word cost dynamic)
    // CALL family (0xF1, 0xF2, 0xF4, 0xFA), RETURN, REVERT, INVALID,
    // SELFDESTRUCT are fully dynamic.

    table
};

// =============================================================================
// DYNAMIC COST HELPERS
// =============================================================================

/// Rounds a byte length up to 32-byte words.
#[must_use]
pub fn to_words(len: usize) -> u64 {
    (len as u64).div_ceil(32)
}

/// Dynamic part of EXP: 50 per byte of exponent magnitude.
#[must_use]
pub fn exp_dynamic_cost(exponent: U256) -> u64 {
    if exponent.is_zero() {
        return 0;
    }
    let bits = 256 - u64::from(exponent.leading_zeros());
    costs::EXP_BYTE * bits.div_ceil(8)
}

/// Dynamic part of KECCAK256: 6 per input word.
#[must_use]
pub fn keccak_dynamic_cost(len: usize) -> u64 {
    costs::KECCAK256_WORD * to_words(len)
}

/// Per-word cost of the copy family.
#[must_use]
pub fn copy_cost(len: usize) -> u64 {
    costs::COPY_WORD * to_words(len)
}

/// Dynamic part of LOGn: topics plus payload bytes.
#[must_use]
pub fn log_dynamic_cost(topics: usize, len: usize) -> u64 {
    costs::LOG_TOPIC * topics as u64 + costs::LOG_DATA * len as u64
}

/// EIP-3860 init-code charge.
#[must_use]
pub fn init_code_cost(len: usize) -> u64 {
    costs::INIT_CODE_WORD * to_words(len)
}

/// Gas actually forwarded to a child call: the requested amount capped at
/// 63/64 of what the caller has left (EIP-150).
#[must_use]
pub fn forwarded_call_gas(gas_left: u64, requested: U256) -> u64 {
    let cap = gas_left - gas_left / 64;
    if requested > U256::from(cap) {
        cap
    } else {
        requested.low_u64()
    }
}

/// Refund credited against gas used, capped at `used / quotient`.
#[must_use]
pub fn capped_refund(gas_used: u64, refund: u64, quotient: u64) -> u64 {
    refund.min(gas_used / quotient.max(1))
}

// =============================================================================
// GAS METER
// =============================================================================

/// Per-frame gas budget and refund counter.
///
/// The refund counter is signed while the frame runs (EIP-2200 reverses
/// earlier refunds when a slot toggles back) and clamped to zero when the
/// frame reports its result.
#[derive(Clone, Copy, Debug)]
pub struct GasMeter {
    gas_left: u64,
    refund: i64,
}

impl GasMeter {
    /// Creates a meter holding the frame's full budget.
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self {
            gas_left: limit,
            refund: 0,
        }
    }

    /// Remaining gas.
    #[must_use]
    pub const fn gas_left(&self) -> u64 {
        self.gas_left
    }

    /// Current refund counter, clamped to zero.
    #[must_use]
    pub fn refund_counter(&self) -> u64 {
        self.refund.max(0) as u64
    }

    /// Deducts `amount`, failing with OutOfGas before any side effect when
    /// the budget is short. The remaining gas is left untouched on failure;
    /// the frame boundary zeroes it when it converts the halt into a result.
    pub fn charge(&mut self, amount: u64) -> Result<(), VmError> {
        if amount > self.gas_left {
            return Err(VmError::OutOfGas);
        }
        self.gas_left -= amount;
        Ok(())
    }

    /// Returns unused gas from a completed child call.
    pub fn give_back(&mut self, amount: u64) {
        self.gas_left = self.gas_left.saturating_add(amount);
    }

    /// Consumes everything that is left (exceptional halt).
    pub fn consume_all(&mut self) {
        self.gas_left = 0;
    }

    /// Adjusts the refund counter by a signed delta.
    pub fn refund(&mut self, delta: i64) {
        self.refund = self.refund.saturating_add(delta);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_and_fail() {
        let mut meter = GasMeter::new(10);
        meter.charge(4).unwrap();
        assert_eq!(meter.gas_left(), 6);
        assert_eq!(meter.charge(7), Err(VmError::OutOfGas));
        // A failed charge leaves the budget alone.
        assert_eq!(meter.gas_left(), 6);
        meter.consume_all();
        assert_eq!(meter.gas_left(), 0);
    }

    #[test]
    fn test_refund_clamped_at_zero() {
        let mut meter = GasMeter::new(100);
        meter.refund(500);
        meter.refund(-900);
        assert_eq!(meter.refund_counter(), 0);
        meter.refund(250);
        assert_eq!(meter.refund_counter(), 0);
        meter.refund(200);
        assert_eq!(meter.refund_counter(), 50);
    }

    #[test]
    fn test_exp_dynamic_cost() {
        assert_eq!(exp_dynamic_cost(U256::zero()), 0);
        assert_eq!(exp_dynamic_cost(U256::from(1)), costs::EXP_BYTE);
        assert_eq!(exp_dynamic_cost(U256::from(255)), costs::EXP_BYTE);
        assert_eq!(exp_dynamic_cost(U256::from(256)), costs::EXP_BYTE * 2);
    }

    #[test]
    fn test_copy_cost_rounds_up() {
        assert_eq!(copy_cost(0), 0);
        assert_eq!(copy_cost(1), costs::COPY_WORD);
        assert_eq!(copy_cost(32), costs::COPY_WORD);
        assert_eq!(copy_cost(33), costs::COPY_WORD * 2);
    }

    #[test]
    fn test_forwarded_call_gas() {
        // Requested below the cap passes through unchanged.
        assert_eq!(forwarded_call_gas(6400, U256::from(1000)), 1000);
        // Requested above the cap is clipped to 63/64.
        assert_eq!(forwarded_call_gas(6400, U256::from(u64::MAX)), 6300);
        // Huge 256-bit requests clip rather than truncate.
        assert_eq!(forwarded_call_gas(6400, U256::MAX), 6300);
    }

    #[test]
    fn test_capped_refund() {
        assert_eq!(capped_refund(1000, 600, 5), 200);
        assert_eq!(capped_refund(1000, 100, 5), 100);
        assert_eq!(capped_refund(1000, 600, 2), 500);
    }

    #[test]
    fn test_base_table_spot_checks() {
        assert_eq!(BASE_GAS[0x01], costs::VERY_LOW); // ADD
        assert_eq!(BASE_GAS[0x00], 0); // STOP
        assert_eq!(BASE_GAS[0x54], 0); // SLOAD is dynamic
        assert_eq!(BASE_GAS[0x60], costs::VERY_LOW); // PUSH1
        assert_eq!(BASE_GAS[0xA2], costs::LOG); // LOG2
        assert_eq!(BASE_GAS[0xF0], costs::CREATE);
    }
}
