//! MODEXP (0x05): arbitrary-precision modular exponentiation, priced per
//! EIP-2565.

use super::{charge, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;
use crate::types::U256;
use num::bigint::BigUint;
use num::traits::Zero;

const MIN_COST: u64 = 200;

/// Modular exponentiation precompile.
pub struct ModExp;

impl Precompile for ModExp {
    fn run(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        // Header: base_len(32) ++ exp_len(32) ++ mod_len(32), zero-padded.
        let base_len = read_length(input, 0)?;
        let exp_len = read_length(input, 32)?;
        let mod_len = read_length(input, 64)?;

        // The gas formula works on the raw lengths, so oversized requests
        // price themselves out before any allocation happens.
        let exp_head = read_region(input, 96 + base_len, exp_len.min(32));
        let cost = gas_cost(base_len as u64, exp_len as u64, mod_len as u64, &exp_head);
        let gas_used = charge(cost, gas_limit)?;

        if mod_len == 0 {
            return Ok(PrecompileOutput {
                gas_used,
                output: Vec::new(),
            });
        }

        let base = BigUint::from_bytes_be(&read_region(input, 96, base_len));
        let exponent = BigUint::from_bytes_be(&read_region(input, 96 + base_len, exp_len));
        let modulus = BigUint::from_bytes_be(&read_region(input, 96 + base_len + exp_len, mod_len));

        let result = if modulus.is_zero() {
            BigUint::zero()
        } else {
            base.modpow(&exponent, &modulus)
        };

        // Left-pad the result to the modulus width.
        let bytes = result.to_bytes_be();
        let mut output = vec![0u8; mod_len];
        output[mod_len - bytes.len()..].copy_from_slice(&bytes);
        Ok(PrecompileOutput { gas_used, output })
    }
}

/// Reads one 32-byte big-endian length field, rejecting values that cannot
/// index memory.
fn read_length(input: &[u8], offset: usize) -> Result<usize, PrecompileError> {
    let word = U256::from_big_endian(&read_region(input, offset, 32));
    if word > U256::from(u32::MAX) {
        return Err(PrecompileError::InvalidInput(format!(
            "modexp length {word} out of range"
        )));
    }
    Ok(word.as_usize())
}

/// Copies `len` bytes starting at `offset`, zero-padding past the input end.
fn read_region(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    if offset < input.len() {
        let available = (input.len() - offset).min(len);
        out[..available].copy_from_slice(&input[offset..offset + available]);
    }
    out
}

/// EIP-2565 pricing.
fn gas_cost(base_len: u64, exp_len: u64, mod_len: u64, exp_head: &[u8]) -> u64 {
    let words = base_len.max(mod_len).div_ceil(8);
    let multiplication_complexity = words.saturating_mul(words);

    let head_bits = bit_length(exp_head);
    let iteration_count = if exp_len <= 32 {
        head_bits.saturating_sub(1)
    } else {
        (8 * (exp_len - 32)).saturating_add(head_bits.saturating_sub(1))
    }
    .max(1);

    multiplication_complexity
        .saturating_mul(iteration_count)
        .checked_div(3)
        .unwrap_or(u64::MAX)
        .max(MIN_COST)
}

fn bit_length(bytes: &[u8]) -> u64 {
    for (i, &byte) in bytes.iter().enumerate() {
        if byte != 0 {
            let remaining = (bytes.len() - i - 1) as u64;
            return remaining * 8 + u64::from(8 - byte.leading_zeros() as u8);
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(base: &[u8], exp: &[u8], modulus: &[u8]) -> Vec<u8> {
        let mut input = Vec::new();
        for len in [base.len(), exp.len(), modulus.len()] {
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&(len as u64).to_be_bytes());
            input.extend_from_slice(&word);
        }
        input.extend_from_slice(base);
        input.extend_from_slice(exp);
        input.extend_from_slice(modulus);
        input
    }

    #[test]
    fn test_small_modexp() {
        // 3^4 mod 5 = 1
        let input = pack(&[3], &[4], &[5]);
        let result = ModExp.run(&input, 10_000).unwrap();
        assert_eq!(result.output, vec![1]);
        assert_eq!(result.gas_used, MIN_COST);
    }

    #[test]
    fn test_zero_modulus_yields_zeros() {
        let input = pack(&[2], &[10], &[0, 0]);
        let result = ModExp.run(&input, 10_000).unwrap();
        assert_eq!(result.output, vec![0, 0]);
    }

    #[test]
    fn test_output_padded_to_modulus_width() {
        // 2^2 mod 100 = 4, modulus is 2 bytes wide.
        let input = pack(&[2], &[2], &[0, 100]);
        let result = ModExp.run(&input, 10_000).unwrap();
        assert_eq!(result.output, vec![0, 4]);
    }

    #[test]
    fn test_empty_input_is_free_shape() {
        // All lengths zero: minimum cost, empty output.
        let result = ModExp.run(&[], 10_000).unwrap();
        assert_eq!(result.gas_used, MIN_COST);
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_huge_exponent_priced_out() {
        // 4096-bit everything with a saturated exponent head.
        let base = vec![0xFFu8; 512];
        let exp = vec![0xFFu8; 512];
        let modulus = vec![0xFFu8; 512];
        let input = pack(&base, &exp, &modulus);
        assert_eq!(ModExp.run(&input, 100_000), Err(PrecompileError::OutOfGas));
    }

    #[test]
    fn test_absurd_length_rejected() {
        let mut input = vec![0u8; 96];
        input[0] = 0xFF; // base_len way past u32
        assert!(matches!(
            ModExp.run(&input, u64::MAX),
            Err(PrecompileError::InvalidInput(_))
        ));
    }
}
