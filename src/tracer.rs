//! # Tracing
//!
//! Observation hooks fired at well-defined points of an execution. Every
//! method has a no-op default, so a tracer implements only what it cares
//! about. Tracers observe; they can never influence execution or gas.

use crate::message::Message;
use crate::opcode::Opcode;
use crate::types::{Address, U256};

/// Execution observer.
#[allow(unused_variables)]
pub trait Tracer {
    /// Fired once before the top-level message runs.
    fn transaction_start(&mut self, message: &Message) {}

    /// Fired before each instruction, after the fetch but before any gas is
    /// charged.
    fn op_start(&mut self, depth: u16, pc: usize, opcode: Opcode, gas_left: u64, stack: &[U256]) {}

    /// Fired after each successfully completed instruction.
    fn op_end(&mut self, gas_left: u64, memory_len: usize) {}

    /// Fired when a message enters a child frame.
    fn call_start(&mut self, message: &Message) {}

    /// Fired when a child frame completes.
    fn call_end(&mut self, depth: u16, success: bool, gas_left: u64) {}

    /// Fired before a precompile runs.
    fn precompile_start(&mut self, address: Address, input_len: usize) {}

    /// Fired after a precompile completes.
    fn precompile_end(&mut self, address: Address, success: bool, gas_used: u64) {}

    /// Fired once with the final gross gas and the capped refund, just
    /// before `transaction_end`.
    fn gas_and_refund(&mut self, gas_used: u64, refund: u64) {}

    /// Fired once after the top-level message completes, with the final
    /// accounting.
    fn transaction_end(&mut self, success: bool, gas_used: u64, refund: u64) {}
}

/// Tracer that records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}

// =============================================================================
// RECORDING TRACER
// =============================================================================

/// One recorded observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// Instruction about to execute.
    Op {
        /// Call depth.
        depth: u16,
        /// Program counter.
        pc: usize,
        /// Fetched opcode.
        opcode: Opcode,
        /// Gas before the instruction charged anything.
        gas_left: u64,
    },
    /// Child frame entered.
    CallStart {
        /// Depth of the child.
        depth: u16,
        /// Target of the child message.
        target: Address,
    },
    /// Child frame completed.
    CallEnd {
        /// Depth of the child.
        depth: u16,
        /// Whether the child returned successfully.
        success: bool,
    },
    /// Precompile completed.
    Precompile {
        /// Precompile address.
        address: Address,
        /// Whether the precompile accepted its input.
        success: bool,
        /// Gas it consumed.
        gas_used: u64,
    },
    /// Top-level message completed.
    Finished {
        /// Whether the transaction succeeded.
        success: bool,
        /// Total gas consumed after refunds.
        gas_used: u64,
    },
}

/// Tracer that appends every observation to a vector; used by the test
/// suite to assert on execution order.
#[derive(Clone, Debug, Default)]
pub struct RecordingTracer {
    /// Recorded events in execution order.
    pub events: Vec<TraceEvent>,
}

impl RecordingTracer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded opcodes, in order.
    #[must_use]
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.events
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Op { opcode, .. } => Some(*opcode),
                _ => None,
            })
            .collect()
    }
}

impl Tracer for RecordingTracer {
    fn op_start(&mut self, depth: u16, pc: usize, opcode: Opcode, gas_left: u64, _stack: &[U256]) {
        self.events.push(TraceEvent::Op {
            depth,
            pc,
            opcode,
            gas_left,
        });
    }

    fn call_start(&mut self, message: &Message) {
        self.events.push(TraceEvent::CallStart {
            depth: message.depth,
            target: message.target,
        });
    }

    fn call_end(&mut self, depth: u16, success: bool, _gas_left: u64) {
        self.events.push(TraceEvent::CallEnd { depth, success });
    }

    fn precompile_end(&mut self, address: Address, success: bool, gas_used: u64) {
        self.events.push(TraceEvent::Precompile {
            address,
            success,
            gas_used,
        });
    }

    fn transaction_end(&mut self, success: bool, gas_used: u64, _refund: u64) {
        self.events.push(TraceEvent::Finished { success, gas_used });
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_tracer_collects_ops() {
        let mut tracer = RecordingTracer::new();
        tracer.op_start(0, 0, Opcode::Push1, 100, &[]);
        tracer.op_start(0, 2, Opcode::Stop, 97, &[]);
        assert_eq!(tracer.opcodes(), vec![Opcode::Push1, Opcode::Stop]);
    }

    #[test]
    fn test_noop_tracer_is_silent() {
        let mut tracer = NoopTracer;
        tracer.op_start(0, 0, Opcode::Stop, 0, &[]);
        tracer.transaction_end(true, 0, 0);
    }
}
