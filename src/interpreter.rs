//! # Instruction Dispatch
//!
//! One [`Executor::step`] per instruction: decode is done by the caller, so
//! this module charges the dynamic gas, applies the stack/memory/state
//! effect, and reports how control continues. Exceptional halts surface as
//! `Err`; REVERT and the normal terminators are `Ok` control values because
//! they keep their remaining gas.

use crate::call::Executor;
use crate::errors::VmError;
use crate::frame::ExecutionFrame;
use crate::gas::{self, costs};
use crate::opcode::Opcode;
use crate::state::StateOracle;
use crate::tracer::Tracer;
use crate::types::{keccak256, Address, Bytes, Hash, Log, StorageKey, StorageValue, U256};

/// How control flows after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Control {
    /// Fall through to the next instruction.
    Continue,
    /// The handler moved the program counter itself.
    Jumped,
    /// Normal halt without output.
    Stop,
    /// Normal halt with output.
    Return,
    /// Revert with output, keeping remaining gas.
    Revert,
}

// =============================================================================
// WORD ARITHMETIC
// =============================================================================

fn is_negative(value: U256) -> bool {
    value.bit(255)
}

fn twos_complement(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn signed_div(numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::zero();
    }
    let min = U256::one() << 255;
    if numerator == min && denominator == U256::MAX {
        // -2^255 / -1 overflows back to -2^255.
        return min;
    }
    let negative = is_negative(numerator) != is_negative(denominator);
    let a = if is_negative(numerator) {
        twos_complement(numerator)
    } else {
        numerator
    };
    let b = if is_negative(denominator) {
        twos_complement(denominator)
    } else {
        denominator
    };
    let quotient = a / b;
    if negative {
        twos_complement(quotient)
    } else {
        quotient
    }
}

fn signed_mod(numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::zero();
    }
    let a = if is_negative(numerator) {
        twos_complement(numerator)
    } else {
        numerator
    };
    let b = if is_negative(denominator) {
        twos_complement(denominator)
    } else {
        denominator
    };
    let remainder = a % b;
    // Result takes the sign of the numerator.
    if is_negative(numerator) {
        twos_complement(remainder)
    } else {
        remainder
    }
}

fn signed_less_than(lhs: U256, rhs: U256) -> bool {
    match (is_negative(lhs), is_negative(rhs)) {
        (true, false) => true,
        (false, true) => false,
        _ => lhs < rhs,
    }
}

fn arithmetic_shift_right(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let shift = shift.low_u64() as usize;
    let mut result = value >> shift;
    if negative && shift > 0 {
        // Fill vacated high bits with ones.
        result |= U256::MAX << (256 - shift);
    }
    result
}

fn sign_extend(byte_index: U256, value: U256) -> U256 {
    if byte_index >= U256::from(31) {
        return value;
    }
    let bit = byte_index.low_u64() as usize * 8 + 7;
    let mask = (U256::one() << (bit + 1)) - U256::one();
    if value.bit(bit) {
        value | !mask
    } else {
        value & mask
    }
}

fn byte_at(index: U256, value: U256) -> U256 {
    if index >= U256::from(32) {
        return U256::zero();
    }
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    U256::from(bytes[index.low_u64() as usize])
}

fn add_mod(a: U256, b: U256, modulus: U256) -> U256 {
    use primitive_types::U512;
    if modulus.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    let result = sum % U512::from(modulus);
    U256::try_from(result).unwrap_or_default()
}

fn mul_mod(a: U256, b: U256, modulus: U256) -> U256 {
    use primitive_types::U512;
    if modulus.is_zero() {
        return U256::zero();
    }
    let product = a.full_mul(b);
    let result = product % U512::from(modulus);
    U256::try_from(result).unwrap_or_default()
}

/// Clamps a word to a memory offset. Anything past `usize` is far past the
/// memory ceiling and will fail the expansion check.
fn as_offset(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

fn bool_word(condition: bool) -> U256 {
    if condition {
        U256::one()
    } else {
        U256::zero()
    }
}

/// Copies from a source buffer into memory, zero-filling past its end.
fn copy_padded(source: &[u8], source_offset: usize, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    if source_offset < source.len() {
        let available = (source.len() - source_offset).min(size);
        out[..available].copy_from_slice(&source[source_offset..source_offset + available]);
    }
    out
}

// =============================================================================
// DISPATCH
// =============================================================================

impl<S: StateOracle, T: Tracer> Executor<'_, S, T> {
    /// Charges the memory expansion for a span plus `extra` dynamic gas,
    /// then grows the buffer.
    pub(crate) fn charge_memory(
        &self,
        frame: &mut ExecutionFrame,
        offset: usize,
        size: usize,
        extra: u64,
    ) -> Result<(), VmError> {
        let growth = frame
            .memory
            .growth_cost(offset, size, self.config.max_memory_size)?;
        frame.gas.charge(growth.saturating_add(extra))?;
        frame.memory.grow(offset, size);
        Ok(())
    }

    fn require_mutable(&self, frame: &ExecutionFrame) -> Result<(), VmError> {
        if frame.message.is_static {
            return Err(VmError::WriteInStaticContext);
        }
        Ok(())
    }

    /// Executes one decoded instruction. The static base cost has already
    /// been charged by the frame loop.
    pub(crate) fn step(
        &mut self,
        frame: &mut ExecutionFrame,
        op: Opcode,
    ) -> Result<Control, VmError> {
        use Opcode::*;

        // The dense families share one handler each.
        if let Some(n) = op.push_bytes() {
            let start = frame.pc + 1;
            let end = (start + n).min(frame.code.len());
            let mut word = [0u8; 32];
            word[32 - n..32 - n + (end - start)].copy_from_slice(&frame.code[start..end]);
            frame.stack.push(U256::from_big_endian(&word))?;
            frame.pc += n;
            return Ok(Control::Continue);
        }
        if let Some(n) = op.dup_depth() {
            frame.stack.dup(n)?;
            return Ok(Control::Continue);
        }
        if let Some(n) = op.swap_depth() {
            frame.stack.swap(n)?;
            return Ok(Control::Continue);
        }
        if let Some(topics) = op.log_topics() {
            return self.op_log(frame, topics);
        }

        match op {
            Stop => return Ok(Control::Stop),

            // ---- Arithmetic ----
            Add => binary(frame, |a, b| a.overflowing_add(b).0)?,
            Mul => binary(frame, |a, b| a.overflowing_mul(b).0)?,
            Sub => binary(frame, |a, b| a.overflowing_sub(b).0)?,
            Div => binary(frame, |a, b| {
                if b.is_zero() {
                    U256::zero()
                } else {
                    a / b
                }
            })?,
            SDiv => binary(frame, signed_div)?,
            Mod => binary(frame, |a, b| {
                if b.is_zero() {
                    U256::zero()
                } else {
                    a % b
                }
            })?,
            SMod => binary(frame, signed_mod)?,
            AddMod => ternary(frame, add_mod)?,
            MulMod => ternary(frame, mul_mod)?,
            Exp => {
                let base = frame.stack.pop()?;
                let exponent = frame.stack.pop()?;
                frame.gas.charge(gas::exp_dynamic_cost(exponent))?;
                frame.stack.push(base.overflowing_pow(exponent).0)?;
            }
            SignExtend => binary(frame, sign_extend)?,

            // ---- Comparison and bitwise ----
            Lt => binary(frame, |a, b| bool_word(a < b))?,
            Gt => binary(frame, |a, b| bool_word(a > b))?,
            SLt => binary(frame, |a, b| bool_word(signed_less_than(a, b)))?,
            SGt => binary(frame, |a, b| bool_word(signed_less_than(b, a)))?,
            Eq => binary(frame, |a, b| bool_word(a == b))?,
            IsZero => {
                let value = frame.stack.pop()?;
                frame.stack.push(bool_word(value.is_zero()))?;
            }
            And => binary(frame, |a, b| a & b)?,
            Or => binary(frame, |a, b| a | b)?,
            Xor => binary(frame, |a, b| a ^ b)?,
            Not => {
                let value = frame.stack.pop()?;
                frame.stack.push(!value)?;
            }
            Byte => binary(frame, byte_at)?,
            Shl => binary(frame, |shift, value| {
                if shift >= U256::from(256) {
                    U256::zero()
                } else {
                    value << shift.low_u64() as usize
                }
            })?,
            Shr => binary(frame, |shift, value| {
                if shift >= U256::from(256) {
                    U256::zero()
                } else {
                    value >> shift.low_u64() as usize
                }
            })?,
            Sar => binary(frame, arithmetic_shift_right)?,

            // ---- Hashing ----
            Keccak256 => {
                let offset = as_offset(frame.stack.pop()?);
                let size = as_offset(frame.stack.pop()?);
                self.charge_memory(frame, offset, size, gas::keccak_dynamic_cost(size))?;
                let data = frame.memory.read_bytes(offset, size);
                frame.stack.push(keccak256(&data).to_word())?;
            }

            // ---- Environment ----
            Address => frame.stack.push(frame.message.target.to_word())?,
            Balance => {
                let address = crate::types::Address::from_word(frame.stack.pop()?);
                self.charge_account_access(frame, address)?;
                let balance = self
                    .state
                    .get_account(address)?
                    .map(|info| info.balance)
                    .unwrap_or_default();
                frame.stack.push(balance)?;
            }
            Origin => frame.stack.push(self.env.origin.to_word())?,
            Caller => frame.stack.push(frame.message.caller.to_word())?,
            CallValue => frame.stack.push(frame.message.value)?,
            CallDataLoad => {
                let offset = as_offset(frame.stack.pop()?);
                let word = copy_padded(frame.message.data.as_slice(), offset, 32);
                frame.stack.push(U256::from_big_endian(&word))?;
            }
            CallDataSize => frame.stack.push(U256::from(frame.message.data.len()))?,
            CallDataCopy => {
                let data = frame.message.data.clone();
                self.op_copy_to_memory(frame, data.as_slice())?;
            }
            CodeSize => frame.stack.push(U256::from(frame.code.len()))?,
            CodeCopy => {
                let code = frame.code.clone();
                self.op_copy_to_memory(frame, &code)?;
            }
            GasPrice => frame.stack.push(self.env.gas_price)?,
            ExtCodeSize => {
                let address = crate::types::Address::from_word(frame.stack.pop()?);
                self.charge_account_access(frame, address)?;
                let code = self.state.get_code(address)?;
                frame.stack.push(U256::from(code.len()))?;
            }
            ExtCodeCopy => {
                let address = crate::types::Address::from_word(frame.stack.pop()?);
                self.charge_account_access(frame, address)?;
                let code = self.state.get_code(address)?;
                self.op_copy_to_memory(frame, &code)?;
            }
            ReturnDataSize => frame.stack.push(U256::from(frame.return_data.len()))?,
            ReturnDataCopy => {
                let dest = as_offset(frame.stack.pop()?);
                let offset = as_offset(frame.stack.pop()?);
                let size = as_offset(frame.stack.pop()?);
                // Unlike the other copies, reads past the buffer are a halt.
                let end = offset.checked_add(size);
                if end.is_none() || end.unwrap_or(usize::MAX) > frame.return_data.len() {
                    return Err(VmError::ReturnDataOutOfBounds {
                        offset,
                        size,
                        available: frame.return_data.len(),
                    });
                }
                self.charge_memory(frame, dest, size, gas::copy_cost(size))?;
                let slice = frame.return_data.as_slice()[offset..offset + size].to_vec();
                frame.memory.write_bytes(dest, &slice);
            }
            ExtCodeHash => {
                let address = crate::types::Address::from_word(frame.stack.pop()?);
                self.charge_account_access(frame, address)?;
                let hash = match self.state.get_account(address)? {
                    Some(info) if !info.is_empty() => info.code_hash.to_word(),
                    _ => U256::zero(),
                };
                frame.stack.push(hash)?;
            }

            // ---- Block information ----
            BlockHash => {
                // No history oracle is wired in; out-of-window semantics.
                frame.stack.pop()?;
                frame.stack.push(U256::zero())?;
            }
            Coinbase => frame.stack.push(self.env.block.coinbase.to_word())?,
            Timestamp => frame.stack.push(U256::from(self.env.block.timestamp))?,
            Number => frame.stack.push(U256::from(self.env.block.number))?,
            PrevRandao => frame.stack.push(self.env.block.prev_randao.to_word())?,
            GasLimit => frame.stack.push(U256::from(self.env.block.gas_limit))?,
            ChainId => frame.stack.push(U256::from(self.env.block.chain_id))?,
            SelfBalance => {
                let balance = self
                    .state
                    .get_account(frame.message.target)?
                    .map(|info| info.balance)
                    .unwrap_or_default();
                frame.stack.push(balance)?;
            }
            BaseFee => {
                if !self.config.has_base_fee {
                    return Err(VmError::InvalidOpcode(op.as_byte()));
                }
                frame.stack.push(self.env.block.base_fee)?;
            }

            // ---- Stack, memory, storage, flow ----
            Pop => {
                frame.stack.pop()?;
            }
            MLoad => {
                let offset = as_offset(frame.stack.pop()?);
                self.charge_memory(frame, offset, 32, 0)?;
                let word = frame.memory.read_word(offset);
                frame.stack.push(U256::from_big_endian(&word))?;
            }
            MStore => {
                let offset = as_offset(frame.stack.pop()?);
                let value = frame.stack.pop()?;
                self.charge_memory(frame, offset, 32, 0)?;
                let mut word = [0u8; 32];
                value.to_big_endian(&mut word);
                frame.memory.write_word(offset, &word);
            }
            MStore8 => {
                let offset = as_offset(frame.stack.pop()?);
                let value = frame.stack.pop()?;
                self.charge_memory(frame, offset, 1, 0)?;
                frame.memory.write_byte(offset, value.low_u64() as u8);
            }
            SLoad => {
                let key = StorageKey::from_word(frame.stack.pop()?);
                let cold = self
                    .access
                    .touch_slot(frame.message.target, key)
                    .is_cold();
                frame.gas.charge(self.config.sload_cost(cold))?;
                let value = self.state.get_storage(frame.message.target, key)?;
                frame.stack.push(value.to_word())?;
            }
            SStore => return self.op_sstore(frame),
            Jump => {
                let target = as_offset(frame.stack.pop()?);
                if !frame.is_valid_jump(target) {
                    return Err(VmError::InvalidJump(target));
                }
                frame.pc = target;
                return Ok(Control::Jumped);
            }
            JumpI => {
                let target = as_offset(frame.stack.pop()?);
                let condition = frame.stack.pop()?;
                if !condition.is_zero() {
                    if !frame.is_valid_jump(target) {
                        return Err(VmError::InvalidJump(target));
                    }
                    frame.pc = target;
                    return Ok(Control::Jumped);
                }
            }
            Pc => frame.stack.push(U256::from(frame.pc))?,
            MSize => frame.stack.push(U256::from(frame.memory.len()))?,
            Gas => frame.stack.push(U256::from(frame.gas.gas_left()))?,
            JumpDest => {}
            TLoad => {
                let key = StorageKey::from_word(frame.stack.pop()?);
                let value = self.transient.load(frame.message.target, key);
                frame.stack.push(value.to_word())?;
            }
            TStore => {
                self.require_mutable(frame)?;
                let key = StorageKey::from_word(frame.stack.pop()?);
                let value = StorageValue::from_word(frame.stack.pop()?);
                self.transient.store(frame.message.target, key, value);
            }
            MCopy => {
                let dest = as_offset(frame.stack.pop()?);
                let src = as_offset(frame.stack.pop()?);
                let size = as_offset(frame.stack.pop()?);
                // Both spans must be addressable before the copy.
                let src_growth = frame
                    .memory
                    .growth_cost(src, size, self.config.max_memory_size)?;
                let dest_growth = frame
                    .memory
                    .growth_cost(dest, size, self.config.max_memory_size)?;
                frame
                    .gas
                    .charge(src_growth.max(dest_growth).saturating_add(gas::copy_cost(size)))?;
                frame.memory.grow(src, size);
                frame.memory.grow(dest, size);
                frame.memory.copy_within(dest, src, size);
            }
            Push0 => {
                if !self.config.has_push0 {
                    return Err(VmError::InvalidOpcode(op.as_byte()));
                }
                frame.stack.push(U256::zero())?;
            }

            // ---- System ----
            Create => return self.op_create(frame, false),
            Create2 => return self.op_create(frame, true),
            Call => return self.op_call(frame, crate::message::CallKind::Call),
            CallCode => return self.op_call(frame, crate::message::CallKind::CallCode),
            DelegateCall => return self.op_call(frame, crate::message::CallKind::DelegateCall),
            StaticCall => return self.op_call(frame, crate::message::CallKind::StaticCall),
            Return => {
                let offset = as_offset(frame.stack.pop()?);
                let size = as_offset(frame.stack.pop()?);
                self.charge_memory(frame, offset, size, 0)?;
                frame.output = Bytes(frame.memory.read_bytes(offset, size));
                return Ok(Control::Return);
            }
            Revert => {
                let offset = as_offset(frame.stack.pop()?);
                let size = as_offset(frame.stack.pop()?);
                self.charge_memory(frame, offset, size, 0)?;
                frame.output = Bytes(frame.memory.read_bytes(offset, size));
                return Ok(Control::Revert);
            }
            Invalid => return Err(VmError::InvalidOpcode(op.as_byte())),
            SelfDestruct => return self.op_selfdestruct(frame),

            // Push/dup/swap/log handled above the match.
            _ => return Err(VmError::InvalidOpcode(op.as_byte())),
        }
        Ok(Control::Continue)
    }

    /// Shared body of CALLDATACOPY, CODECOPY, and EXTCODECOPY: pops
    /// dest/offset/size, charges copy and expansion, zero-pads the read.
    fn op_copy_to_memory(
        &mut self,
        frame: &mut ExecutionFrame,
        source: &[u8],
    ) -> Result<(), VmError> {
        let dest = as_offset(frame.stack.pop()?);
        let offset = as_offset(frame.stack.pop()?);
        let size = as_offset(frame.stack.pop()?);
        self.charge_memory(frame, dest, size, gas::copy_cost(size))?;
        let data = copy_padded(source, offset, size);
        frame.memory.write_bytes(dest, &data);
        Ok(())
    }

    /// Touches an account for BALANCE/EXTCODE*/CALL targets and charges the
    /// warmth-dependent cost.
    pub(crate) fn charge_account_access(
        &mut self,
        frame: &mut ExecutionFrame,
        address: Address,
    ) -> Result<(), VmError> {
        let cold = self.access.touch_address(address).is_cold();
        frame.gas.charge(self.config.account_access_cost(cold))
    }

    fn op_log(&mut self, frame: &mut ExecutionFrame, topic_count: usize) -> Result<Control, VmError> {
        self.require_mutable(frame)?;
        let offset = as_offset(frame.stack.pop()?);
        let size = as_offset(frame.stack.pop()?);
        let mut topics = Vec::with_capacity(topic_count);
        for _ in 0..topic_count {
            let mut bytes = [0u8; 32];
            frame.stack.pop()?.to_big_endian(&mut bytes);
            topics.push(Hash::new(bytes));
        }
        self.charge_memory(frame, offset, size, gas::log_dynamic_cost(topic_count, size))?;
        let data = Bytes(frame.memory.read_bytes(offset, size));
        frame.logs.push(Log::new(frame.message.target, topics, data));
        Ok(Control::Continue)
    }

    /// SSTORE with the EIP-2200/3529 original-value accounting. The net-new
    /// cost cases key off three values: the slot as it was when the
    /// transaction started (original), as it is now (current), and the value
    /// being written (new).
    fn op_sstore(&mut self, frame: &mut ExecutionFrame) -> Result<Control, VmError> {
        self.require_mutable(frame)?;
        // EIP-2200 sentry: refuse to run on a stipend-sized budget.
        if frame.gas.gas_left() <= costs::SSTORE_SENTRY {
            return Err(VmError::OutOfGas);
        }
        let key = StorageKey::from_word(frame.stack.pop()?);
        let new = StorageValue::from_word(frame.stack.pop()?);
        let target = frame.message.target;

        let cold = self.access.touch_slot(target, key).is_cold();
        let cold_surcharge = if self.config.has_access_lists && cold {
            self.config.cold_sload_cost
        } else {
            0
        };

        let current = self.state.get_storage(target, key)?;
        let original = self.state.original_storage(target, key)?;
        let config = self.config;

        let base_cost = if new == current {
            config.warm_sload_cost
        } else if original == current {
            if original.is_zero() {
                config.sstore_set_cost
            } else {
                config.sstore_reset_cost
            }
        } else {
            config.warm_sload_cost
        };
        frame.gas.charge(base_cost + cold_surcharge)?;

        // Refund bookkeeping only moves when the value actually changes.
        if new != current {
            if original == current {
                if !original.is_zero() && new.is_zero() {
                    frame.gas.refund(config.sstore_clear_refund as i64);
                }
            } else {
                // Dirty slot: reconcile any clear refund granted earlier.
                if !original.is_zero() {
                    if current.is_zero() {
                        frame.gas.refund(-(config.sstore_clear_refund as i64));
                    }
                    if new.is_zero() {
                        frame.gas.refund(config.sstore_clear_refund as i64);
                    }
                }
                // Restoring the original value refunds the difference against
                // what the first write overpaid.
                if new == original {
                    let delta = if original.is_zero() {
                        config.sstore_set_cost - config.warm_sload_cost
                    } else {
                        config.sstore_reset_cost - config.warm_sload_cost
                    };
                    frame.gas.refund(delta as i64);
                }
            }
        }

        self.state.set_storage(target, key, new)?;
        Ok(Control::Continue)
    }
}

fn binary(
    frame: &mut ExecutionFrame,
    op: impl FnOnce(U256, U256) -> U256,
) -> Result<(), VmError> {
    let a = frame.stack.pop()?;
    let b = frame.stack.pop()?;
    frame.stack.push(op(a, b))
}

fn ternary(
    frame: &mut ExecutionFrame,
    op: impl FnOnce(U256, U256, U256) -> U256,
) -> Result<(), VmError> {
    let a = frame.stack.pop()?;
    let b = frame.stack.pop()?;
    let c = frame.stack.pop()?;
    frame.stack.push(op(a, b, c))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u64) -> U256 {
        U256::from(n)
    }

    fn neg(n: u64) -> U256 {
        twos_complement(U256::from(n))
    }

    #[test]
    fn test_signed_div() {
        assert_eq!(signed_div(neg(10), word(2)), neg(5));
        assert_eq!(signed_div(neg(10), neg(2)), word(5));
        assert_eq!(signed_div(word(10), neg(2)), neg(5));
        assert_eq!(signed_div(word(10), U256::zero()), U256::zero());

        // The overflow corner: -2^255 / -1 wraps to itself.
        let min = U256::one() << 255;
        assert_eq!(signed_div(min, U256::MAX), min);
    }

    #[test]
    fn test_signed_mod_takes_numerator_sign() {
        assert_eq!(signed_mod(neg(10), word(3)), neg(1));
        assert_eq!(signed_mod(word(10), neg(3)), word(1));
        assert_eq!(signed_mod(word(10), U256::zero()), U256::zero());
    }

    #[test]
    fn test_signed_comparison() {
        assert!(signed_less_than(neg(1), word(0)));
        assert!(!signed_less_than(word(0), neg(1)));
        assert!(signed_less_than(neg(5), neg(3)));
        assert!(signed_less_than(word(3), word(5)));
    }

    #[test]
    fn test_sar() {
        assert_eq!(arithmetic_shift_right(word(1), neg(4)), neg(2));
        assert_eq!(arithmetic_shift_right(word(1), word(4)), word(2));
        assert_eq!(arithmetic_shift_right(word(300), neg(1)), U256::MAX);
        assert_eq!(arithmetic_shift_right(word(300), word(7)), U256::zero());
        assert_eq!(arithmetic_shift_right(U256::zero(), neg(4)), neg(4));
    }

    #[test]
    fn test_sign_extend() {
        // Extend 0xFF from byte 0: becomes -1.
        assert_eq!(sign_extend(word(0), word(0xFF)), U256::MAX);
        // 0x7F keeps its value.
        assert_eq!(sign_extend(word(0), word(0x7F)), word(0x7F));
        // Index past 30 is the identity.
        assert_eq!(sign_extend(word(31), word(0xFF00)), word(0xFF00));
        // High garbage above the extension byte is masked off.
        assert_eq!(sign_extend(word(0), word(0x1234)), word(0x34));
    }

    #[test]
    fn test_byte_at() {
        let value = U256::from_big_endian(&{
            let mut bytes = [0u8; 32];
            bytes[0] = 0xAA;
            bytes[31] = 0xBB;
            bytes
        });
        assert_eq!(byte_at(word(0), value), word(0xAA));
        assert_eq!(byte_at(word(31), value), word(0xBB));
        assert_eq!(byte_at(word(32), value), U256::zero());
    }

    #[test]
    fn test_mod_arithmetic_512_bit_intermediate() {
        // (MAX + MAX) % MAX == 0 only works with a wide intermediate.
        assert_eq!(add_mod(U256::MAX, U256::MAX, U256::MAX), U256::zero());
        assert_eq!(add_mod(U256::MAX, word(1), word(10)), word(6));
        assert_eq!(mul_mod(U256::MAX, U256::MAX, U256::MAX), U256::zero());
        assert_eq!(mul_mod(word(0), word(5), U256::zero()), U256::zero());
    }

    #[test]
    fn test_copy_padded() {
        let source = [1u8, 2, 3];
        assert_eq!(copy_padded(&source, 0, 5), vec![1, 2, 3, 0, 0]);
        assert_eq!(copy_padded(&source, 2, 2), vec![3, 0]);
        assert_eq!(copy_padded(&source, 10, 3), vec![0, 0, 0]);
    }
}
