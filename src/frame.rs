//! # Execution Frames
//!
//! One [`ExecutionFrame`] per message on the call stack: program counter,
//! operand stack, memory, gas meter, and the substate (logs) accumulated so
//! far. The valid-jump bitmap is computed once when the frame is built, so
//! JUMP validation never rescans the code.

use crate::errors::VmError;
use crate::gas::GasMeter;
use crate::memory::Memory;
use crate::message::Message;
use crate::stack::Stack;
use crate::types::{Bytes, Log};
use std::sync::Arc;

// =============================================================================
// JUMP DESTINATION ANALYSIS
// =============================================================================

/// Marks every JUMPDEST byte that is reachable as an instruction, skipping
/// the immediate data of PUSH1..PUSH32.
#[must_use]
pub fn analyze_jump_dests(code: &[u8]) -> Vec<bool> {
    let mut valid = vec![false; code.len()];
    let mut pc = 0;
    while pc < code.len() {
        let byte = code[pc];
        if byte == 0x5B {
            valid[pc] = true;
            pc += 1;
        } else if (0x60..=0x7F).contains(&byte) {
            pc += 1 + usize::from(byte - 0x5F);
        } else {
            pc += 1;
        }
    }
    valid
}

// =============================================================================
// FRAME
// =============================================================================

/// Terminal state of a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Still executing.
    Running,
    /// Halted normally via STOP, RETURN, or running off the end of code.
    Returned,
    /// Halted via REVERT; output carries the revert payload.
    Reverted,
    /// Exceptional halt; all remaining gas was consumed.
    Halted(VmError),
}

/// Live execution state of one message call.
pub struct ExecutionFrame {
    /// Message this frame executes.
    pub message: Message,
    /// Next instruction offset.
    pub pc: usize,
    /// Operand stack.
    pub stack: Stack,
    /// Frame-local memory.
    pub memory: Memory,
    /// Gas budget and refund counter.
    pub gas: GasMeter,
    /// Code being executed (init code for creates).
    pub code: Arc<[u8]>,
    /// Valid JUMPDEST bitmap over `code`.
    jump_dests: Vec<bool>,
    /// Return buffer from the most recent completed child call.
    pub return_data: Bytes,
    /// Output produced by RETURN or REVERT.
    pub output: Bytes,
    /// Logs emitted by this frame and committed children.
    pub logs: Vec<Log>,
    /// Terminal status.
    pub status: FrameStatus,
}

impl ExecutionFrame {
    /// Builds a frame for `message` running `code`.
    #[must_use]
    pub fn new(message: Message, code: Arc<[u8]>) -> Self {
        let gas = GasMeter::new(message.gas);
        let jump_dests = analyze_jump_dests(&code);
        Self {
            message,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas,
            code,
            jump_dests,
            return_data: Bytes::new(),
            output: Bytes::new(),
            logs: Vec::new(),
            status: FrameStatus::Running,
        }
    }

    /// Returns true when `target` is a valid jump destination.
    #[must_use]
    pub fn is_valid_jump(&self, target: usize) -> bool {
        self.jump_dests.get(target).copied().unwrap_or(false)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, U256};

    #[test]
    fn test_jump_dest_analysis_skips_push_data() {
        // PUSH2 0x5B 0x5B, JUMPDEST
        let code = [0x61, 0x5B, 0x5B, 0x5B];
        let valid = analyze_jump_dests(&code);
        assert_eq!(valid, vec![false, false, false, true]);
    }

    #[test]
    fn test_jump_dest_truncated_push() {
        // PUSH32 with only two data bytes left; nothing after is reachable.
        let code = [0x7F, 0x5B, 0x5B];
        let valid = analyze_jump_dests(&code);
        assert_eq!(valid, vec![false, false, false]);
    }

    #[test]
    fn test_frame_initial_state() {
        let msg = Message::transaction_call(
            Address::new([1; 20]),
            Address::new([2; 20]),
            U256::zero(),
            Bytes::new(),
            50_000,
        );
        let frame = ExecutionFrame::new(msg, Arc::from([0x5B, 0x00].as_slice()));
        assert_eq!(frame.pc, 0);
        assert_eq!(frame.gas.gas_left(), 50_000);
        assert_eq!(frame.status, FrameStatus::Running);
        assert!(frame.is_valid_jump(0));
        assert!(!frame.is_valid_jump(1));
        assert!(!frame.is_valid_jump(100));
    }
}
