//! # Messages
//!
//! A [`Message`] is the unit of work handed to the call dispatcher: one
//! call or create at one depth, with its own gas budget and static flag.
//! Frames are spawned from messages; messages are spawned from the
//! CALL/CREATE family or from the transaction entry point.

use crate::types::{Address, Bytes, Hash, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// CALL KIND
// =============================================================================

/// Flavor of a message call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// Plain CALL: new storage/value context at the target.
    Call,
    /// CALLCODE: target's code, caller's storage, explicit value.
    CallCode,
    /// DELEGATECALL: target's code, caller's storage, caller's value and
    /// sender preserved.
    DelegateCall,
    /// STATICCALL: like CALL with the static flag raised and zero value.
    StaticCall,
    /// CREATE: deploy with the nonce-derived address.
    Create,
    /// CREATE2: deploy with the salt-derived address.
    Create2 {
        /// Caller-chosen salt mixed into the address.
        salt: Hash,
    },
}

impl CallKind {
    /// Returns true for CREATE/CREATE2.
    #[must_use]
    pub fn is_create(self) -> bool {
        matches!(self, CallKind::Create | CallKind::Create2 { .. })
    }
}

// =============================================================================
// MESSAGE
// =============================================================================

/// A single call or create to execute.
#[derive(Clone, Debug)]
pub struct Message {
    /// Call flavor.
    pub kind: CallKind,
    /// Account the frame reports as CALLER.
    pub caller: Address,
    /// Account whose storage and balance the frame operates on. For creates
    /// this is the not-yet-deployed address.
    pub target: Address,
    /// Account whose code runs. Differs from `target` for CALLCODE and
    /// DELEGATECALL.
    pub code_address: Address,
    /// Wei transferred with the message (apparent value for DELEGATECALL).
    pub value: U256,
    /// Calldata, or init code for creates.
    pub data: Bytes,
    /// Gas budget granted to the frame.
    pub gas: u64,
    /// Nesting depth; the transaction entry point runs at zero.
    pub depth: u16,
    /// True inside any STATICCALL subtree.
    pub is_static: bool,
}

impl Message {
    /// Builds the top-level message of a transaction calling `target`.
    #[must_use]
    pub fn transaction_call(
        caller: Address,
        target: Address,
        value: U256,
        data: Bytes,
        gas: u64,
    ) -> Self {
        Self {
            kind: CallKind::Call,
            caller,
            target,
            code_address: target,
            value,
            data,
            gas,
            depth: 0,
            is_static: false,
        }
    }

    /// Builds the top-level message of a contract-creation transaction. The
    /// target address is filled in by the dispatcher once the caller's nonce
    /// is known.
    #[must_use]
    pub fn transaction_create(caller: Address, value: U256, init_code: Bytes, gas: u64) -> Self {
        Self {
            kind: CallKind::Create,
            caller,
            target: Address::ZERO,
            code_address: Address::ZERO,
            value,
            data: init_code,
            gas,
            depth: 0,
            is_static: false,
        }
    }
}

// =============================================================================
// BLOCK & TRANSACTION ENVIRONMENT
// =============================================================================

/// Block-level values visible to the 0x40 opcode range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockContext {
    /// COINBASE.
    pub coinbase: Address,
    /// TIMESTAMP.
    pub timestamp: u64,
    /// NUMBER.
    pub number: u64,
    /// PREVRANDAO (post-merge randomness beacon).
    pub prev_randao: Hash,
    /// GASLIMIT.
    pub gas_limit: u64,
    /// BASEFEE.
    pub base_fee: U256,
    /// CHAINID.
    pub chain_id: u64,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            coinbase: Address::ZERO,
            timestamp: 0,
            number: 0,
            prev_randao: Hash::ZERO,
            gas_limit: 30_000_000,
            base_fee: U256::zero(),
            chain_id: 1,
        }
    }
}

/// Transaction-level environment shared by every frame of one execution.
#[derive(Clone, Debug, Default)]
pub struct Env {
    /// ORIGIN: externally-owned account that signed the transaction.
    pub origin: Address,
    /// GASPRICE.
    pub gas_price: U256,
    /// Enclosing block.
    pub block: BlockContext,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_call_shape() {
        let caller = Address::new([1; 20]);
        let target = Address::new([2; 20]);
        let msg = Message::transaction_call(
            caller,
            target,
            U256::from(5),
            Bytes::copy_from_slice(&[0xAB]),
            21_000,
        );
        assert_eq!(msg.kind, CallKind::Call);
        assert_eq!(msg.code_address, target);
        assert_eq!(msg.depth, 0);
        assert!(!msg.is_static);
    }

    #[test]
    fn test_create_kinds() {
        assert!(CallKind::Create.is_create());
        assert!(CallKind::Create2 { salt: Hash::ZERO }.is_create());
        assert!(!CallKind::DelegateCall.is_create());
    }
}
