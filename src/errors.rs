//! # Error Types
//!
//! The halt taxonomy for the execution engine. Every variant of [`VmError`]
//! except the state wrapper is an exceptional halt: it consumes all remaining
//! gas of the frame that raised it and discards the frame's substate. REVERT
//! is intentionally *not* an error value; it is a terminal frame status.

use crate::types::{Address, U256};
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Exceptional halt conditions raised during execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// A gas charge exceeded the remaining budget.
    #[error("out of gas")]
    OutOfGas,

    /// A push would grow the stack past 1024 items.
    #[error("stack overflow")]
    StackOverflow,

    /// A pop found fewer operands than the instruction requires.
    #[error("stack underflow")]
    StackUnderflow,

    /// An undefined opcode byte was fetched.
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// JUMP/JUMPI targeted a byte that is not a JUMPDEST marker.
    #[error("invalid jump destination: {0}")]
    InvalidJump(usize),

    /// A call or create would exceed the maximum nesting depth.
    #[error("call depth exceeded: {depth}")]
    CallDepthExceeded {
        /// Depth the rejected message would have run at.
        depth: u16,
    },

    /// A state-mutating instruction ran inside a STATICCALL subtree.
    #[error("state modification in static context")]
    WriteInStaticContext,

    /// A value transfer exceeded the sender's balance.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Amount the transfer required.
        required: U256,
        /// Balance actually available.
        available: U256,
    },

    /// CREATE/CREATE2 targeted an address already occupied by an account
    /// with code or a non-zero nonce.
    #[error("address collision on create: {0}")]
    AddressCollision(Address),

    /// RETURNDATACOPY read past the end of the return buffer.
    #[error("return data out of bounds: offset {offset} size {size} available {available}")]
    ReturnDataOutOfBounds {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        size: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// Memory expansion passed the hard cap.
    #[error("memory limit exceeded: {requested} > {max} bytes")]
    MemoryLimitExceeded {
        /// Bytes the access would require.
        requested: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// Deployed code exceeds the EIP-170 limit.
    #[error("code size exceeded: {size} > {max} bytes")]
    CodeSizeExceeded {
        /// Size of the code the frame tried to deposit.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// Init code exceeds the EIP-3860 limit.
    #[error("init code size exceeded: {size} > {max} bytes")]
    InitCodeSizeExceeded {
        /// Size of the supplied init code.
        size: usize,
        /// Configured ceiling.
        max: usize,
    },

    /// Deployed code begins with the reserved 0xEF byte (EIP-3541).
    #[error("deployed code starts with reserved 0xEF byte")]
    InvalidCodePrefix,

    /// A precompile rejected its input.
    #[error("precompile failure: {0}")]
    PrecompileFailure(String),

    /// The state oracle itself failed; indicates a broken host, not a
    /// spec-defined outcome.
    #[error(transparent)]
    State(#[from] StateError),
}

// =============================================================================
// STATE ERRORS
// =============================================================================

/// Failures of the state oracle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Commit or rollback was requested with no open savepoint.
    #[error("no open savepoint")]
    MissingSavepoint,

    /// The oracle detected an internally inconsistent state.
    #[error("state inconsistency: {0}")]
    Inconsistent(String),
}

// =============================================================================
// PRECOMPILE ERRORS
// =============================================================================

/// Failures of precompiled contracts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// The gas available to the call is below the precompile's cost.
    #[error("precompile out of gas")]
    OutOfGas,

    /// The input could not be interpreted.
    #[error("invalid precompile input: {0}")]
    InvalidInput(String),
}

impl From<PrecompileError> for VmError {
    fn from(err: PrecompileError) -> Self {
        match err {
            PrecompileError::OutOfGas => VmError::OutOfGas,
            PrecompileError::InvalidInput(msg) => VmError::PrecompileFailure(msg),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
