//! # Call Dispatch
//!
//! The recursive orchestrator behind [`process_message_call`]: it opens a
//! savepoint per message, runs the frame (or a precompile), and commits or
//! rolls back based on how the frame halted. Gas flows down through the
//! 63/64 rule and back up through `give_back`; refunds and logs only travel
//! upward across committed frames.

use crate::access::AccessSets;
use crate::errors::{PrecompileError, StateError, VmError};
use crate::fork::ForkConfig;
use crate::frame::{ExecutionFrame, FrameStatus};
use crate::gas::{self, costs, BASE_GAS};
use crate::interpreter::Control;
use crate::message::{CallKind, Env, Message};
use crate::opcode::Opcode;
use crate::precompiles;
use crate::state::StateOracle;
use crate::tracer::Tracer;
use crate::transient::TransientStorage;
use crate::types::{keccak256, Address, Bytes, Hash, Log, StorageKey, U256};
use primitive_types::H160;
use std::sync::Arc;
use tracing::{debug, trace};

// =============================================================================
// RESULTS
// =============================================================================

/// Outcome of a completed top-level execution.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    /// Whether the top-level frame committed.
    pub success: bool,
    /// Gas remaining after execution (before the refund is applied).
    pub gas_left: u64,
    /// Gas consumed, gross of the refund.
    pub gas_used: u64,
    /// Refund granted, already capped against `gas_used`.
    pub gas_refund: u64,
    /// RETURN or REVERT payload; deployed code for a successful create.
    pub output: Bytes,
    /// Logs from every committed frame.
    pub logs: Vec<Log>,
    /// Address deployed by a top-level create.
    pub created_address: Option<Address>,
    /// Halt reason when `success` is false and the failure was exceptional.
    pub error: Option<VmError>,
    /// Every address touched, for receipt construction.
    pub accessed_addresses: Vec<Address>,
    /// Every storage slot touched.
    pub accessed_storage_keys: Vec<(Address, StorageKey)>,
}

/// Outcome of one message, as seen by its parent frame.
#[derive(Clone, Debug)]
pub(crate) struct FrameResult {
    pub success: bool,
    pub gas_left: u64,
    pub refund: u64,
    pub output: Bytes,
    pub logs: Vec<Log>,
    pub created: Option<Address>,
    pub error: Option<VmError>,
}

impl FrameResult {
    /// A failed message that hands its unconsumed budget back.
    fn failure(gas_left: u64, error: VmError) -> Self {
        Self {
            success: false,
            gas_left,
            refund: 0,
            output: Bytes::new(),
            logs: Vec::new(),
            created: None,
            error: Some(error),
        }
    }
}

// =============================================================================
// SELFDESTRUCT BOOKKEEPING
// =============================================================================

/// Accounts already credited a SELFDESTRUCT refund this transaction,
/// journaled so a reverted frame's claims are discarded with the rest of
/// its substate.
#[derive(Debug, Default)]
pub(crate) struct DestroyedAccounts {
    addresses: Vec<Address>,
    savepoints: Vec<usize>,
}

impl DestroyedAccounts {
    fn new() -> Self {
        Self::default()
    }

    /// Records a refund claim; returns false when the address already holds
    /// one.
    fn claim(&mut self, address: Address) -> bool {
        if self.addresses.contains(&address) {
            return false;
        }
        self.addresses.push(address);
        true
    }

    /// Opens a savepoint, mirroring the state oracle's.
    fn begin(&mut self) {
        self.savepoints.push(self.addresses.len());
    }

    /// Merges the innermost savepoint into its parent.
    fn commit(&mut self) {
        self.savepoints.pop();
    }

    /// Drops claims made since the innermost savepoint opened.
    fn revert(&mut self) {
        let mark = self.savepoints.pop().unwrap_or(0);
        self.addresses.truncate(mark);
    }
}

// =============================================================================
// ADDRESS DERIVATION
// =============================================================================

/// CREATE address: low 20 bytes of `keccak(rlp([sender, nonce]))`.
#[must_use]
pub fn create_address(caller: Address, nonce: u64) -> Address {
    let mut stream = rlp::RlpStream::new_list(2);
    stream.append(&H160::from_slice(caller.as_bytes()));
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::new(bytes)
}

/// CREATE2 address: low 20 bytes of
/// `keccak(0xff ++ sender ++ salt ++ keccak(init_code))`.
#[must_use]
pub fn create2_address(caller: Address, salt: Hash, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);
    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xFF);
    preimage.extend_from_slice(caller.as_bytes());
    preimage.extend_from_slice(salt.as_bytes());
    preimage.extend_from_slice(code_hash.as_bytes());
    let hash = keccak256(&preimage);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::new(bytes)
}

// =============================================================================
// EXECUTOR
// =============================================================================

/// Execution context threaded through every frame of one transaction.
pub(crate) struct Executor<'a, S: StateOracle, T: Tracer> {
    pub(crate) state: &'a mut S,
    pub(crate) tracer: &'a mut T,
    pub(crate) env: &'a Env,
    pub(crate) config: &'a ForkConfig,
    pub(crate) access: AccessSets,
    pub(crate) transient: TransientStorage,
    /// SELFDESTRUCT refund claims, unwound with the frame that made them.
    pub(crate) destroyed: DestroyedAccounts,
}

/// Runs one complete message call against `state` and reports the result.
///
/// This is the transaction-level entry point: it seeds the warm sets, runs
/// the message tree, caps the refund, and drops the transient store. The
/// caller is responsible for the surrounding intrinsic-gas and fee
/// accounting.
///
/// # Errors
///
/// [`StateError`] when the state oracle itself fails; everything the
/// executed code can cause is reported inside [`ExecutionResult`].
pub fn process_message_call<S: StateOracle, T: Tracer>(
    message: Message,
    state: &mut S,
    tracer: &mut T,
    env: &Env,
    config: &ForkConfig,
) -> Result<ExecutionResult, StateError> {
    let mut executor = Executor {
        state,
        tracer,
        env,
        config,
        access: AccessSets::new(),
        transient: TransientStorage::new(),
        destroyed: DestroyedAccounts::new(),
    };

    // EIP-2929 preamble: origin, target, and the precompiles start warm.
    executor.access.prewarm_address(env.origin);
    executor.access.prewarm_address(message.caller);
    if !message.kind.is_create() {
        executor.access.prewarm_address(message.target);
    }
    for address in precompiles::addresses() {
        executor.access.prewarm_address(address);
    }

    debug!(
        caller = %message.caller,
        target = %message.target,
        gas = message.gas,
        depth = message.depth,
        "executing message call"
    );
    executor.tracer.transaction_start(&message);

    let budget = message.gas;
    let result = executor.execute_message(message)?;

    let gas_used = budget - result.gas_left;
    let gas_refund = if result.success {
        gas::capped_refund(gas_used, result.refund, config.refund_quotient)
    } else {
        0
    };
    executor.tracer.gas_and_refund(gas_used, gas_refund);
    executor
        .tracer
        .transaction_end(result.success, gas_used - gas_refund, gas_refund);
    executor.transient.clear();

    debug!(
        success = result.success,
        gas_used,
        gas_refund,
        "message call finished"
    );

    Ok(ExecutionResult {
        success: result.success,
        gas_left: result.gas_left,
        gas_used,
        gas_refund,
        output: result.output,
        logs: result.logs,
        created_address: result.created,
        error: result.error,
        accessed_addresses: executor.access.addresses().iter().copied().collect(),
        accessed_storage_keys: executor.access.slots().iter().copied().collect(),
    })
}

impl<S: StateOracle, T: Tracer> Executor<'_, S, T> {
    // =========================================================================
    // SUBSTATE SAVEPOINTS
    // =========================================================================

    /// Opens one savepoint across the state oracle, the transient store, and
    /// the selfdestruct bookkeeping.
    fn begin_substate(&mut self) -> Result<(), StateError> {
        self.state.begin_transaction()?;
        self.transient.begin();
        self.destroyed.begin();
        Ok(())
    }

    /// Merges the innermost savepoint into its parent.
    fn commit_substate(&mut self) -> Result<(), StateError> {
        self.state.commit_transaction()?;
        self.transient.commit();
        self.destroyed.commit();
        Ok(())
    }

    /// Discards everything since the innermost savepoint opened.
    fn revert_substate(&mut self) -> Result<(), StateError> {
        self.state.rollback_transaction()?;
        self.transient.revert();
        self.destroyed.revert();
        Ok(())
    }

    // =========================================================================
    // MESSAGE EXECUTION
    // =========================================================================

    /// Runs one message at its own savepoint and reports how it halted.
    pub(crate) fn execute_message(&mut self, message: Message) -> Result<FrameResult, StateError> {
        let depth = message.depth;
        self.tracer.call_start(&message);
        let result = if message.kind.is_create() {
            self.run_create(message)
        } else {
            self.run_call(message)
        }?;
        self.tracer.call_end(depth, result.success, result.gas_left);
        Ok(result)
    }

    fn run_call(&mut self, message: Message) -> Result<FrameResult, StateError> {
        if message.depth > self.config.max_call_depth {
            return Ok(FrameResult::failure(
                message.gas,
                VmError::CallDepthExceeded {
                    depth: message.depth,
                },
            ));
        }

        let transfers_value =
            matches!(message.kind, CallKind::Call | CallKind::CallCode) && !message.value.is_zero();
        if transfers_value {
            let available = self
                .state
                .get_account(message.caller)?
                .map(|info| info.balance)
                .unwrap_or_default();
            if available < message.value {
                return Ok(FrameResult::failure(
                    message.gas,
                    VmError::InsufficientBalance {
                        required: message.value,
                        available,
                    },
                ));
            }
        }

        self.begin_substate()?;

        // CALLCODE runs foreign code against the caller's own account, so
        // the value never actually moves.
        if message.kind == CallKind::Call && !message.value.is_zero() {
            self.state
                .move_ether(message.caller, message.target, message.value)?;
        }

        if precompiles::is_precompile(message.code_address) {
            return self.run_precompile(message);
        }

        let code = self.state.get_code(message.code_address)?;
        if code.is_empty() {
            // Nothing to run; the transfer alone commits.
            self.commit_substate()?;
            return Ok(FrameResult {
                success: true,
                gas_left: message.gas,
                refund: 0,
                output: Bytes::new(),
                logs: Vec::new(),
                created: None,
                error: None,
            });
        }

        let mut frame = ExecutionFrame::new(message, code);
        let error = self.run_frame(&mut frame)?;
        self.finish_call_frame(frame, error)
    }

    fn run_create(&mut self, message: Message) -> Result<FrameResult, StateError> {
        if message.depth > self.config.max_call_depth {
            return Ok(FrameResult::failure(
                message.gas,
                VmError::CallDepthExceeded {
                    depth: message.depth,
                },
            ));
        }
        if self.config.limit_init_code && message.data.len() > self.config.max_init_code_size {
            return Ok(FrameResult::failure(
                message.gas,
                VmError::InitCodeSizeExceeded {
                    size: message.data.len(),
                    max: self.config.max_init_code_size,
                },
            ));
        }

        let caller_info = self.state.get_account(message.caller)?;
        let available = caller_info
            .as_ref()
            .map(|info| info.balance)
            .unwrap_or_default();
        if available < message.value {
            return Ok(FrameResult::failure(
                message.gas,
                VmError::InsufficientBalance {
                    required: message.value,
                    available,
                },
            ));
        }

        let nonce = caller_info.map(|info| info.nonce).unwrap_or(0);
        let address = match message.kind {
            CallKind::Create2 { salt } => {
                create2_address(message.caller, salt, message.data.as_slice())
            }
            _ => create_address(message.caller, nonce),
        };

        // The creator's nonce moves in the parent context: it survives even
        // if the init code reverts.
        self.state.increment_nonce(message.caller)?;
        self.access.prewarm_address(address);

        if let Some(existing) = self.state.get_account(address)? {
            let has_code = existing.code_hash != keccak256(&[]);
            if existing.nonce > 0 || has_code {
                // A collision burns the forwarded gas.
                return Ok(FrameResult::failure(0, VmError::AddressCollision(address)));
            }
        }

        self.begin_substate()?;

        self.state.increment_nonce(address)?;
        if !message.value.is_zero() {
            self.state
                .move_ether(message.caller, address, message.value)?;
        }

        let init_code: Arc<[u8]> = Arc::from(message.data.as_slice());
        let frame_message = Message {
            target: address,
            code_address: address,
            data: Bytes::new(),
            ..message
        };
        let mut frame = ExecutionFrame::new(frame_message, init_code);
        let error = self.run_frame(&mut frame)?;
        self.finish_create_frame(frame, error, address)
    }

    fn run_precompile(&mut self, message: Message) -> Result<FrameResult, StateError> {
        // Both savepoints are already open.
        let address = message.code_address;
        self.tracer.precompile_start(address, message.data.len());

        let contract = match precompiles::dispatch(address) {
            Some(contract) => contract,
            None => {
                // is_precompile and dispatch cover the same range.
                self.revert_substate()?;
                return Ok(FrameResult::failure(
                    0,
                    VmError::PrecompileFailure(format!("no precompile at {address}")),
                ));
            }
        };

        match contract.run(message.data.as_slice(), message.gas) {
            Ok(output) => {
                self.tracer
                    .precompile_end(address, true, output.gas_used);
                self.commit_substate()?;
                Ok(FrameResult {
                    success: true,
                    gas_left: message.gas - output.gas_used,
                    refund: 0,
                    output: Bytes(output.output),
                    logs: Vec::new(),
                    created: None,
                    error: None,
                })
            }
            Err(err) => {
                self.tracer.precompile_end(address, false, message.gas);
                self.revert_substate()?;
                let error = match err {
                    PrecompileError::OutOfGas => VmError::OutOfGas,
                    other => VmError::from(other),
                };
                Ok(FrameResult::failure(0, error))
            }
        }
    }

    // =========================================================================
    // FRAME LOOP
    // =========================================================================

    /// Runs a frame to its terminal status. Exceptional halts come back as
    /// `Ok(Some(_))` with the frame's gas already consumed; `Err` is
    /// reserved for the state oracle failing.
    fn run_frame(&mut self, frame: &mut ExecutionFrame) -> Result<Option<VmError>, StateError> {
        loop {
            // Running off the end of code is an implicit STOP.
            if frame.pc >= frame.code.len() {
                frame.status = FrameStatus::Returned;
                return Ok(None);
            }
            let byte = frame.code[frame.pc];
            let op = match Opcode::from_byte(byte) {
                Some(op) => op,
                None => {
                    frame.gas.consume_all();
                    frame.status = FrameStatus::Halted(VmError::InvalidOpcode(byte));
                    return Ok(Some(VmError::InvalidOpcode(byte)));
                }
            };

            self.tracer.op_start(
                frame.message.depth,
                frame.pc,
                op,
                frame.gas.gas_left(),
                frame.stack.as_slice(),
            );

            let outcome = frame
                .gas
                .charge(BASE_GAS[byte as usize])
                .and_then(|()| self.step(frame, op));

            match outcome {
                Ok(Control::Continue) => {
                    frame.pc += 1;
                    self.tracer.op_end(frame.gas.gas_left(), frame.memory.len());
                }
                Ok(Control::Jumped) => {
                    self.tracer.op_end(frame.gas.gas_left(), frame.memory.len());
                }
                Ok(Control::Stop | Control::Return) => {
                    frame.status = FrameStatus::Returned;
                    self.tracer.op_end(frame.gas.gas_left(), frame.memory.len());
                    return Ok(None);
                }
                Ok(Control::Revert) => {
                    frame.status = FrameStatus::Reverted;
                    self.tracer.op_end(frame.gas.gas_left(), frame.memory.len());
                    return Ok(None);
                }
                Err(VmError::State(err)) => return Err(err),
                Err(err) => {
                    trace!(pc = frame.pc, op = ?op, %err, "exceptional halt");
                    frame.gas.consume_all();
                    frame.status = FrameStatus::Halted(err.clone());
                    return Ok(Some(err));
                }
            }
        }
    }

    fn finish_call_frame(
        &mut self,
        frame: ExecutionFrame,
        error: Option<VmError>,
    ) -> Result<FrameResult, StateError> {
        match (&frame.status, error) {
            (FrameStatus::Returned, None) => {
                self.commit_substate()?;
                Ok(FrameResult {
                    success: true,
                    gas_left: frame.gas.gas_left(),
                    refund: frame.gas.refund_counter(),
                    output: frame.output,
                    logs: frame.logs,
                    created: None,
                    error: None,
                })
            }
            (FrameStatus::Reverted, None) => {
                self.revert_substate()?;
                // REVERT keeps its remaining gas but forfeits logs and
                // refunds with the rest of the substate.
                Ok(FrameResult {
                    success: false,
                    gas_left: frame.gas.gas_left(),
                    refund: 0,
                    output: frame.output,
                    logs: Vec::new(),
                    created: None,
                    error: None,
                })
            }
            (_, error) => {
                self.revert_substate()?;
                Ok(FrameResult::failure(
                    0,
                    error.unwrap_or(VmError::InvalidOpcode(0xFE)),
                ))
            }
        }
    }

    fn finish_create_frame(
        &mut self,
        mut frame: ExecutionFrame,
        error: Option<VmError>,
        address: Address,
    ) -> Result<FrameResult, StateError> {
        if error.is_none() && frame.status == FrameStatus::Returned {
            let code = std::mem::take(&mut frame.output);

            // Deposit checks run in order: prefix, size, then the per-byte
            // charge. Any failure is an exceptional halt of the create frame.
            let deposit_error = if self.config.reject_ef_code
                && code.as_slice().first() == Some(&0xEF)
            {
                Some(VmError::InvalidCodePrefix)
            } else if code.len() > self.config.max_code_size {
                Some(VmError::CodeSizeExceeded {
                    size: code.len(),
                    max: self.config.max_code_size,
                })
            } else if frame
                .gas
                .charge(costs::CODE_DEPOSIT_BYTE * code.len() as u64)
                .is_err()
            {
                Some(VmError::OutOfGas)
            } else {
                None
            };

            if let Some(err) = deposit_error {
                self.revert_substate()?;
                return Ok(FrameResult::failure(0, err));
            }

            self.state.set_code(address, code.clone())?;
            self.commit_substate()?;
            return Ok(FrameResult {
                success: true,
                gas_left: frame.gas.gas_left(),
                refund: frame.gas.refund_counter(),
                output: code,
                logs: frame.logs,
                created: Some(address),
                error: None,
            });
        }

        self.revert_substate()?;
        if error.is_none() && frame.status == FrameStatus::Reverted {
            let gas_left = if self.config.create_failure_returns_gas {
                frame.gas.gas_left()
            } else {
                0
            };
            return Ok(FrameResult {
                success: false,
                gas_left,
                refund: 0,
                output: frame.output,
                logs: Vec::new(),
                created: None,
                error: None,
            });
        }
        Ok(FrameResult::failure(
            0,
            error.unwrap_or(VmError::InvalidOpcode(0xFE)),
        ))
    }

    // =========================================================================
    // CALL-FAMILY HANDLERS
    // =========================================================================

    /// CALL, CALLCODE, DELEGATECALL, STATICCALL.
    pub(crate) fn op_call(
        &mut self,
        frame: &mut ExecutionFrame,
        kind: CallKind,
    ) -> Result<Control, VmError> {
        let requested_gas = frame.stack.pop()?;
        let to = Address::from_word(frame.stack.pop()?);
        let value = match kind {
            CallKind::Call | CallKind::CallCode => frame.stack.pop()?,
            CallKind::DelegateCall => frame.message.value,
            _ => U256::zero(),
        };
        let in_offset = word_to_offset(frame.stack.pop()?);
        let in_size = word_to_offset(frame.stack.pop()?);
        let out_offset = word_to_offset(frame.stack.pop()?);
        let out_size = word_to_offset(frame.stack.pop()?);

        if kind == CallKind::Call && frame.message.is_static && !value.is_zero() {
            return Err(VmError::WriteInStaticContext);
        }

        self.charge_account_access(frame, to)?;
        self.charge_memory(frame, in_offset, in_size, 0)?;
        self.charge_memory(frame, out_offset, out_size, 0)?;

        let transfers_value =
            matches!(kind, CallKind::Call | CallKind::CallCode) && !value.is_zero();
        let mut extra = 0u64;
        if transfers_value {
            extra += costs::CALL_VALUE;
        }
        if kind == CallKind::Call && !value.is_zero() && !self.state.account_exists(to)? {
            extra += costs::CALL_NEW_ACCOUNT;
        }
        frame.gas.charge(extra)?;

        let forwarded = gas::forwarded_call_gas(frame.gas.gas_left(), requested_gas);
        frame.gas.charge(forwarded)?;
        let child_gas = if transfers_value {
            // The stipend is granted on top; the caller never pays for it.
            forwarded + costs::CALL_STIPEND
        } else {
            forwarded
        };

        let input = Bytes(frame.memory.read_bytes(in_offset, in_size));
        let child = Message {
            kind,
            caller: match kind {
                CallKind::DelegateCall => frame.message.caller,
                _ => frame.message.target,
            },
            target: match kind {
                CallKind::CallCode | CallKind::DelegateCall => frame.message.target,
                _ => to,
            },
            code_address: to,
            value,
            data: input,
            gas: child_gas,
            depth: frame.message.depth + 1,
            is_static: frame.message.is_static || kind == CallKind::StaticCall,
        };

        let result = self.execute_message(child)?;

        // The output span was grown above, so this write cannot fail.
        let copy_len = out_size.min(result.output.len());
        if copy_len > 0 {
            frame
                .memory
                .write_bytes(out_offset, &result.output.as_slice()[..copy_len]);
        }
        frame.return_data = result.output;
        frame.gas.give_back(result.gas_left);

        if result.success {
            frame.gas.refund(result.refund as i64);
            frame.logs.extend(result.logs);
            frame.stack.push(U256::one())?;
        } else {
            frame.stack.push(U256::zero())?;
        }
        Ok(Control::Continue)
    }

    /// CREATE and CREATE2.
    pub(crate) fn op_create(
        &mut self,
        frame: &mut ExecutionFrame,
        is_create2: bool,
    ) -> Result<Control, VmError> {
        if frame.message.is_static {
            return Err(VmError::WriteInStaticContext);
        }
        let value = frame.stack.pop()?;
        let offset = word_to_offset(frame.stack.pop()?);
        let size = word_to_offset(frame.stack.pop()?);
        let salt = if is_create2 {
            let mut bytes = [0u8; 32];
            frame.stack.pop()?.to_big_endian(&mut bytes);
            Some(Hash::new(bytes))
        } else {
            None
        };

        // EIP-3860: oversized init code halts the creating frame.
        if self.config.limit_init_code && size > self.config.max_init_code_size {
            return Err(VmError::InitCodeSizeExceeded {
                size,
                max: self.config.max_init_code_size,
            });
        }
        let mut extra = 0u64;
        if self.config.limit_init_code {
            extra += gas::init_code_cost(size);
        }
        if is_create2 {
            // CREATE2 hashes the init code for the address derivation.
            extra += gas::keccak_dynamic_cost(size);
        }
        self.charge_memory(frame, offset, size, extra)?;

        let forwarded = gas::forwarded_call_gas(frame.gas.gas_left(), U256::MAX);
        frame.gas.charge(forwarded)?;

        let init_code = Bytes(frame.memory.read_bytes(offset, size));
        let child = Message {
            kind: match salt {
                Some(salt) => CallKind::Create2 { salt },
                None => CallKind::Create,
            },
            caller: frame.message.target,
            target: Address::ZERO,
            code_address: Address::ZERO,
            value,
            data: init_code,
            gas: forwarded,
            depth: frame.message.depth + 1,
            is_static: false,
        };

        let result = self.execute_message(child)?;

        // Return data is only observable after a failed create.
        frame.return_data = if result.success {
            Bytes::new()
        } else {
            result.output
        };
        frame.gas.give_back(result.gas_left);

        if result.success {
            frame.gas.refund(result.refund as i64);
            frame.logs.extend(result.logs);
            let created = result.created.unwrap_or(Address::ZERO);
            frame.stack.push(created.to_word())?;
        } else {
            frame.stack.push(U256::zero())?;
        }
        Ok(Control::Continue)
    }

    /// SELFDESTRUCT.
    pub(crate) fn op_selfdestruct(
        &mut self,
        frame: &mut ExecutionFrame,
    ) -> Result<Control, VmError> {
        if frame.message.is_static {
            return Err(VmError::WriteInStaticContext);
        }
        let beneficiary = Address::from_word(frame.stack.pop()?);
        let target = frame.message.target;

        let cold = self.access.touch_address(beneficiary).is_cold();
        let mut cost = costs::SELFDESTRUCT;
        if self.config.has_access_lists && cold {
            cost += self.config.cold_account_cost;
        }
        let balance = self
            .state
            .get_account(target)?
            .map(|info| info.balance)
            .unwrap_or_default();
        if !balance.is_zero() && !self.state.account_exists(beneficiary)? {
            cost += costs::SELFDESTRUCT_NEW_ACCOUNT;
        }
        frame.gas.charge(cost)?;

        if beneficiary == target {
            // Sending to self burns the balance with the account.
            self.state.set_account_balance(target, U256::zero())?;
        } else if !balance.is_zero() {
            self.state.move_ether(target, beneficiary, balance)?;
        }

        if self.config.selfdestruct_refund > 0 && self.destroyed.claim(target) {
            frame.gas.refund(self.config.selfdestruct_refund as i64);
        }
        self.state.destroy_account(target)?;
        Ok(Control::Stop)
    }
}

/// Clamps a word to a memory offset; oversized values fail the expansion
/// check downstream.
fn word_to_offset(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

/// Best-effort decode of a Solidity `Error(string)` revert payload. Returns
/// `None` when the output is not in that shape; the raw bytes stay available
/// on the result either way.
#[must_use]
pub fn revert_reason(output: &Bytes) -> Option<String> {
    const ERROR_SELECTOR: [u8; 4] = [0x08, 0xC3, 0x79, 0xA0];
    let data = output.as_slice();
    if data.len() < 4 + 32 + 32 || data[..4] != ERROR_SELECTOR {
        return None;
    }
    let head = &data[4..];
    let offset = U256::from_big_endian(&head[..32]);
    if offset != U256::from(32) {
        return None;
    }
    let length = U256::from_big_endian(&head[32..64]);
    if length > U256::from(head.len().saturating_sub(64)) {
        return None;
    }
    let length = length.as_usize();
    String::from_utf8(head[64..64 + length].to_vec()).ok()
}

// =============================================================================
// TESTS
// =============================================================================
