//! RIPEMD160 (0x03).

use super::{charge, linear_cost, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;
use ripemd::{Digest, Ripemd160 as RipemdDigest};

const BASE_COST: u64 = 600;
const WORD_COST: u64 = 120;

/// RIPEMD-160 hashing precompile. The 20-byte digest is returned left-padded
/// to a 32-byte word.
pub struct Ripemd160;

impl Precompile for Ripemd160 {
    fn run(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let gas_used = charge(linear_cost(BASE_COST, WORD_COST, input.len()), gas_limit)?;
        let digest = RipemdDigest::digest(input);
        let mut output = vec![0u8; 32];
        output[12..].copy_from_slice(&digest);
        Ok(PrecompileOutput { gas_used, output })
    }
}
