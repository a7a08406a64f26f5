//! # EVM Execution Engine
//!
//! A synchronous EVM interpreter: message calls go in, an
//! [`ExecutionResult`] comes out, and every state access flows through the
//! host-provided [`StateOracle`]. The engine covers the full opcode space
//! through Shanghai (plus transient storage and MCOPY), the warm/cold gas
//! schedule, the refund rules, and precompiles 0x01..0x05.
//!
//! ## Usage
//!
//! ```
//! use evm_engine::{
//!     process_message_call, Bytes, ForkConfig, InMemoryState, Message,
//!     NoopTracer, Address, Env, U256,
//! };
//!
//! let mut state = InMemoryState::new();
//! let caller = Address::new([1; 20]);
//! let target = Address::new([2; 20]);
//! state.create_account(caller, U256::from(1_000_000));
//! // PUSH1 0x01 PUSH1 0x02 ADD STOP
//! state.create_contract(target, U256::zero(), &[0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
//!
//! let message = Message::transaction_call(caller, target, U256::zero(), Bytes::new(), 100_000);
//! let result = process_message_call(
//!     message,
//!     &mut state,
//!     &mut NoopTracer,
//!     &Env::default(),
//!     &ForkConfig::shanghai(),
//! )
//! .unwrap();
//! assert!(result.success);
//! ```
//!
//! ## Architecture
//!
//! - [`call`]: the recursive dispatcher; savepoints, gas forwarding,
//!   precompile routing.
//! - [`interpreter`]: per-instruction semantics and dynamic gas.
//! - [`state`]: the [`StateOracle`] seam and the journaled in-memory
//!   backend.
//! - [`gas`], [`fork`]: the cost tables and per-fork schedule.
//! - [`tracer`]: observation hooks; tracers can never affect execution.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod call;
pub mod errors;
pub mod fork;
pub mod frame;
pub mod gas;
pub mod interpreter;
pub mod memory;
pub mod message;
pub mod opcode;
pub mod precompiles;
pub mod stack;
pub mod state;
pub mod tracer;
pub mod transient;
pub mod types;

pub use access::{AccessSets, AccessStatus};
pub use call::{
    create2_address, create_address, process_message_call, revert_reason, ExecutionResult,
};
pub use errors::{PrecompileError, StateError, VmError};
pub use fork::{Fork, ForkConfig};
pub use frame::{ExecutionFrame, FrameStatus};
pub use gas::GasMeter;
pub use memory::Memory;
pub use message::{BlockContext, CallKind, Env, Message};
pub use opcode::Opcode;
pub use stack::Stack;
pub use state::{AccountInfo, InMemoryState, StateOracle};
pub use tracer::{NoopTracer, RecordingTracer, TraceEvent, Tracer};
pub use transient::TransientStorage;
pub use types::{keccak256, Address, Bytes, Hash, Log, StorageKey, StorageValue, U256};
