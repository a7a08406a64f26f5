//! SHA256 (0x02).

use super::{charge, linear_cost, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;
use sha2::{Digest, Sha256};

const BASE_COST: u64 = 60;
const WORD_COST: u64 = 12;

/// SHA-256 hashing precompile.
pub struct Sha256Hash;

impl Precompile for Sha256Hash {
    fn run(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let gas_used = charge(linear_cost(BASE_COST, WORD_COST, input.len()), gas_limit)?;
        let output = Sha256::digest(input).to_vec();
        Ok(PrecompileOutput { gas_used, output })
    }
}
