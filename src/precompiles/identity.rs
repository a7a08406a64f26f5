//! IDENTITY (0x04): returns its input.

use super::{charge, linear_cost, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;

const BASE_COST: u64 = 15;
const WORD_COST: u64 = 3;

/// Data-copy precompile.
pub struct Identity;

impl Precompile for Identity {
    fn run(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let gas_used = charge(linear_cost(BASE_COST, WORD_COST, input.len()), gas_limit)?;
        Ok(PrecompileOutput {
            gas_used,
            output: input.to_vec(),
        })
    }
}
