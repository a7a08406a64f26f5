//! # Precompiled Contracts
//!
//! Contracts 0x01..0x05: native implementations dispatched by address before
//! any bytecode lookup. Each precompile computes its gas cost from the input
//! shape and charges it before doing any work; an input the precompile cannot
//! price or parse consumes the cost and fails the call frame.

mod ecrecover;
mod identity;
mod modexp;
mod ripemd160;
mod sha256;

pub use ecrecover::EcRecover;
pub use identity::Identity;
pub use modexp::ModExp;
pub use ripemd160::Ripemd160;
pub use sha256::Sha256Hash;

use crate::errors::PrecompileError;
use crate::types::Address;

/// Result of a successful precompile run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecompileOutput {
    /// Gas the run consumed.
    pub gas_used: u64,
    /// Returned bytes.
    pub output: Vec<u8>,
}

/// A natively-implemented contract.
pub trait Precompile {
    /// Runs the precompile against `input` with at most `gas_limit` gas.
    ///
    /// # Errors
    ///
    /// [`PrecompileError::OutOfGas`] when the priced cost exceeds the limit,
    /// [`PrecompileError::InvalidInput`] when the input cannot be accepted.
    fn run(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError>;
}

/// Looks up the precompile at `address`, if any.
#[must_use]
pub fn dispatch(address: Address) -> Option<&'static dyn Precompile> {
    match precompile_index(address)? {
        1 => Some(&EcRecover),
        2 => Some(&Sha256Hash),
        3 => Some(&Ripemd160),
        4 => Some(&Identity),
        5 => Some(&ModExp),
        _ => None,
    }
}

/// Returns true when `address` hosts a precompile.
#[must_use]
pub fn is_precompile(address: Address) -> bool {
    matches!(precompile_index(address), Some(1..=5))
}

/// All precompile addresses, for pre-warming the transaction access set.
#[must_use]
pub fn addresses() -> Vec<Address> {
    (1u8..=5).map(address_of).collect()
}

fn address_of(index: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = index;
    Address::new(bytes)
}

fn precompile_index(address: Address) -> Option<u8> {
    let bytes = address.as_bytes();
    if bytes[..19] != [0u8; 19] {
        return None;
    }
    Some(bytes[19])
}

/// Shared linear gas formula: `base + word · ceil(len / 32)`.
pub(crate) fn linear_cost(base: u64, word: u64, len: usize) -> u64 {
    base + word * (len as u64).div_ceil(32)
}

/// Charges `cost` against `gas_limit` up front.
pub(crate) fn charge(cost: u64, gas_limit: u64) -> Result<u64, PrecompileError> {
    if cost > gas_limit {
        return Err(PrecompileError::OutOfGas);
    }
    Ok(cost)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_known_addresses() {
        for index in 1u8..=5 {
            assert!(dispatch(address_of(index)).is_some());
            assert!(is_precompile(address_of(index)));
        }
    }

    #[test]
    fn test_dispatch_unknown_addresses() {
        assert!(dispatch(Address::ZERO).is_none());
        assert!(dispatch(address_of(6)).is_none());
        assert!(!is_precompile(Address::new([1; 20])));
    }

    #[test]
    fn test_linear_cost_rounds_up() {
        assert_eq!(linear_cost(15, 3, 0), 15);
        assert_eq!(linear_cost(15, 3, 1), 18);
        assert_eq!(linear_cost(15, 3, 32), 18);
        assert_eq!(linear_cost(15, 3, 33), 21);
    }
}
