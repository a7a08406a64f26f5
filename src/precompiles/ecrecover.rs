//! ECRECOVER (0x01): secp256k1 public key recovery.

use super::{charge, Precompile, PrecompileOutput};
use crate::errors::PrecompileError;
use crate::types::keccak256;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

const ECRECOVER_COST: u64 = 3_000;

/// Signature recovery precompile.
///
/// A malformed signature is not an error: the contract returns empty output
/// and the caller sees success, matching on-chain behavior.
pub struct EcRecover;

impl Precompile for EcRecover {
    fn run(&self, input: &[u8], gas_limit: u64) -> Result<PrecompileOutput, PrecompileError> {
        let gas_used = charge(ECRECOVER_COST, gas_limit)?;

        let output = recover(input).unwrap_or_default();
        Ok(PrecompileOutput { gas_used, output })
    }
}

/// Attempts recovery; any malformed field yields `None`.
fn recover(input: &[u8]) -> Option<Vec<u8>> {
    // Input is hash(32) ++ v(32) ++ r(32) ++ s(32), zero-padded on the right.
    let mut padded = [0u8; 128];
    let len = input.len().min(128);
    padded[..len].copy_from_slice(&input[..len]);

    let hash = &padded[..32];
    let v_word = &padded[32..64];
    let rs = &padded[64..128];

    // v must be exactly 27 or 28 with 31 zero bytes of padding.
    if v_word[..31] != [0u8; 31] {
        return None;
    }
    let recovery_id = RecoveryId::try_from(v_word[31].checked_sub(27)?).ok()?;

    let signature = Signature::from_slice(rs).ok()?;
    let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id).ok()?;

    // Address is the low 20 bytes of keccak over the uncompressed point
    // without its 0x04 tag, left-padded to a word.
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    let mut out = vec![0u8; 32];
    out[12..].copy_from_slice(&digest.as_bytes()[12..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::U256;

    #[test]
    fn test_gas_checked_before_work() {
        assert_eq!(
            EcRecover.run(&[0u8; 128], 2_999),
            Err(PrecompileError::OutOfGas)
        );
    }

    #[test]
    fn test_garbage_input_returns_empty_success() {
        let result = EcRecover.run(&[0xFFu8; 128], 10_000).unwrap();
        assert_eq!(result.gas_used, 3_000);
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_bad_v_returns_empty() {
        let mut input = [0u8; 128];
        input[63] = 29; // v out of range
        input[95] = 1; // r = 1
        input[127] = 1; // s = 1
        let result = EcRecover.run(&input, 10_000).unwrap();
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_known_signature_recovers() {
        // Vector from the original ecrecover test corpus.
        let hash =
            hex::decode("456e9aea5e197a1f1af7a3e85a3212fa4049a3ba34c2289b4c860fc0b0c64ef3")
                .unwrap();
        let r = hex::decode("9242685bf161793cc25603c231bc2f568eb630ea16aa137d2664ac8038825608")
            .unwrap();
        let s = hex::decode("4f8ae3bd7535248d0bd448298cc2e2071e56992d0774dc340c368ae950852ada")
            .unwrap();

        let mut input = Vec::new();
        input.extend_from_slice(&hash);
        let mut v = [0u8; 32];
        v[31] = 28;
        input.extend_from_slice(&v);
        input.extend_from_slice(&r);
        input.extend_from_slice(&s);

        let result = EcRecover.run(&input, 10_000).unwrap();
        assert_eq!(result.output.len(), 32);
        assert_eq!(result.output[..12], [0u8; 12]);
        // Recovered signer must be a non-zero address.
        assert!(U256::from_big_endian(&result.output) > U256::zero());
    }
}
