//! End-to-end execution scenarios: gas accounting, revert isolation,
//! creates, precompiles, and static-context enforcement, all driven through
//! `process_message_call` against the journaled in-memory state.

use evm_engine::{
    create_address, process_message_call, Address, Bytes, Env, ExecutionResult, Fork, ForkConfig,
    InMemoryState, Message, NoopTracer, Opcode, RecordingTracer, StateOracle, StorageKey,
    StorageValue, Tracer, U256, VmError,
};

const CALLER: Address = Address::new([0x11; 20]);
const CONTRACT: Address = Address::new([0x22; 20]);
const OTHER: Address = Address::new([0x33; 20]);
const HELPER: Address = Address::new([0x44; 20]);

fn slot(n: u64) -> StorageKey {
    StorageKey::from_word(U256::from(n))
}

/// Honors `RUST_LOG` so a failing scenario can be rerun with the engine's
/// own tracing visible.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn run(state: &mut InMemoryState, message: Message) -> ExecutionResult {
    run_traced(state, message, &mut NoopTracer)
}

fn run_traced<T: Tracer>(
    state: &mut InMemoryState,
    message: Message,
    tracer: &mut T,
) -> ExecutionResult {
    run_with_config(state, message, tracer, &ForkConfig::shanghai())
}

fn run_with_config<T: Tracer>(
    state: &mut InMemoryState,
    message: Message,
    tracer: &mut T,
    config: &ForkConfig,
) -> ExecutionResult {
    init_tracing();
    process_message_call(message, state, tracer, &Env::default(), config).unwrap()
}

fn call_message(gas: u64) -> Message {
    Message::transaction_call(CALLER, CONTRACT, U256::zero(), Bytes::new(), gas)
}

fn setup(code: &[u8]) -> InMemoryState {
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(1_000_000_000u64));
    state.create_contract(CONTRACT, U256::zero(), code);
    state
}

/// Bytecode that calls `target` forwarding 0xFFFF gas with no value or data.
fn call_snippet(target: Address) -> Vec<u8> {
    let mut code = vec![
        0x60, 0x00, // retSize
        0x60, 0x00, // retOffset
        0x60, 0x00, // argsSize
        0x60, 0x00, // argsOffset
        0x60, 0x00, // value
        0x73, // PUSH20 target
    ];
    code.extend_from_slice(target.as_bytes());
    code.extend_from_slice(&[0x61, 0xFF, 0xFF, 0xF1]); // PUSH2 0xFFFF, CALL
    code
}

// =============================================================================
// GAS ACCOUNTING
// =============================================================================

#[test]
fn test_add_program_costs_nine_gas() {
    // PUSH1 1, PUSH1 1, ADD, STOP
    let mut state = setup(&[0x60, 0x01, 0x60, 0x01, 0x01, 0x00]);
    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    assert_eq!(result.gas_used, 9);
    assert_eq!(result.gas_left, 99_991);
}

#[test]
fn test_invalid_opcode_consumes_everything() {
    let mut state = setup(&[0xFE]);
    let result = run(&mut state, call_message(21_000));
    assert!(!result.success);
    assert_eq!(result.gas_left, 0);
    assert_eq!(result.gas_used, 21_000);
    assert_eq!(result.error, Some(VmError::InvalidOpcode(0xFE)));
}

#[test]
fn test_warm_sload_is_cheaper_than_cold() {
    // PUSH1 0, SLOAD, POP, PUSH1 0, SLOAD, STOP
    let mut state = setup(&[0x60, 0x00, 0x54, 0x50, 0x60, 0x00, 0x54, 0x00]);
    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    // 3 + 2100 (cold) + 2 + 3 + 100 (warm)
    assert_eq!(result.gas_used, 2_208);
}

#[test]
fn test_memory_expansion_charged_by_word() {
    // PUSH1 0x2A, PUSH1 0, MSTORE, STOP: one word of expansion costs 3.
    let mut state = setup(&[0x60, 0x2A, 0x60, 0x00, 0x52, 0x00]);
    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    assert_eq!(result.gas_used, 3 + 3 + 3 + 3);
}

#[test]
fn test_out_of_gas_rolls_back_storage() {
    // SSTORE(0, 1), then a KECCAK over 64 KiB the budget cannot cover.
    let code = [
        0x60, 0x01, 0x60, 0x00, 0x55, // SSTORE
        0x62, 0x01, 0x00, 0x00, // PUSH3 65536 (size)
        0x60, 0x00, // offset
        0x20, // KECCAK256
        0x00,
    ];
    let mut state = setup(&code);
    let result = run(&mut state, call_message(25_000));
    assert!(!result.success);
    assert_eq!(result.gas_left, 0);
    assert_eq!(result.error, Some(VmError::OutOfGas));
    // The SSTORE that succeeded mid-frame was undone with the frame.
    assert_eq!(
        state.get_storage(CONTRACT, slot(0)).unwrap(),
        StorageValue::ZERO
    );
}

// =============================================================================
// SSTORE REFUNDS
// =============================================================================

#[test]
fn test_clearing_a_slot_refunds_up_to_the_cap() {
    // SSTORE(0, 0) on a slot holding 1.
    let mut state = setup(&[0x60, 0x00, 0x60, 0x00, 0x55, 0x00]);
    state.seed_storage(CONTRACT, slot(0), StorageValue::from_word(U256::one()));
    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    // 3 + 3 + 2100 (cold) + 2900 (reset) = 5006 gross.
    assert_eq!(result.gas_used, 5_006);
    // Clear refund 4800 capped at gas_used / 5.
    assert_eq!(result.gas_refund, 5_006 / 5);
}

#[test]
fn test_net_zero_write_refunds_the_set_cost() {
    // SSTORE(0, 1) then SSTORE(0, 0): slot ends at its original zero.
    let code = [
        0x60, 0x01, 0x60, 0x00, 0x55, // set
        0x60, 0x00, 0x60, 0x00, 0x55, // clear back to original
        0x00,
    ];
    let mut state = setup(&code);
    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    // 3+3 + 22100 (cold set) + 3+3 + 100 (dirty) = 22212 gross.
    assert_eq!(result.gas_used, 22_212);
    // Restoring the original refunds 19900, capped at 22212 / 5.
    assert_eq!(result.gas_refund, 22_212 / 5);
}

#[test]
fn test_reverted_frame_forfeits_its_refund() {
    // Child clears a non-zero slot, then reverts.
    let child_code = [
        0x60, 0x00, 0x60, 0x00, 0x55, // SSTORE(0, 0)
        0x60, 0x00, 0x60, 0x00, 0xFD, // REVERT(0, 0)
    ];
    let mut caller_code = call_snippet(OTHER);
    caller_code.push(0x00);

    let mut state = setup(&caller_code);
    state.create_contract(OTHER, U256::zero(), &child_code);
    state.seed_storage(OTHER, slot(0), StorageValue::from_word(U256::one()));

    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    assert_eq!(result.gas_refund, 0);
    // And the write itself was rolled back.
    assert_eq!(
        state.get_storage(OTHER, slot(0)).unwrap(),
        StorageValue::from_word(U256::one())
    );
}

// =============================================================================
// REVERT AND RETURN DATA
// =============================================================================

#[test]
fn test_revert_returns_payload_and_remaining_gas() {
    // MSTORE 0x0102 at word 0, REVERT(30, 2).
    let code = [
        0x61, 0x01, 0x02, // PUSH2 0x0102
        0x60, 0x00, 0x52, // MSTORE
        0x60, 0x02, 0x60, 0x1E, 0xFD, // REVERT(offset=30, size=2)
    ];
    let mut state = setup(&code);
    let result = run(&mut state, call_message(100_000));
    assert!(!result.success);
    assert_eq!(result.error, None);
    assert_eq!(result.output.as_slice(), &[0x01, 0x02]);
    assert!(result.gas_left > 0);
}

#[test]
fn test_caller_observes_child_revert_data() {
    // Child reverts with 0x0102; caller copies the return data out and
    // returns it as its own output.
    let child_code = [
        0x61, 0x01, 0x02, 0x60, 0x00, 0x52, // MSTORE 0x0102
        0x60, 0x02, 0x60, 0x1E, 0xFD, // REVERT(30, 2)
    ];
    let mut caller_code = call_snippet(OTHER);
    caller_code.extend_from_slice(&[
        0x60, 0x02, 0x60, 0x00, 0x60, 0x00, 0x3E, // RETURNDATACOPY(0, 0, 2)
        0x60, 0x02, 0x60, 0x00, 0xF3, // RETURN(0, 2)
    ]);

    let mut state = setup(&caller_code);
    state.create_contract(OTHER, U256::zero(), &child_code);

    let result = run(&mut state, call_message(200_000));
    assert!(result.success);
    assert_eq!(result.output.as_slice(), &[0x01, 0x02]);
}

#[test]
fn test_child_storage_rolls_back_but_parent_commits() {
    // Child writes its own slot 0 and reverts; parent then writes its own
    // slot 0 and stops.
    let child_code = [
        0x60, 0x01, 0x60, 0x00, 0x55, // SSTORE(0, 1)
        0x60, 0x00, 0x60, 0x00, 0xFD, // REVERT(0, 0)
    ];
    let mut caller_code = call_snippet(OTHER);
    caller_code.extend_from_slice(&[0x60, 0x07, 0x60, 0x00, 0x55, 0x00]); // SSTORE(0, 7), STOP

    let mut state = setup(&caller_code);
    state.create_contract(OTHER, U256::zero(), &child_code);

    let result = run(&mut state, call_message(200_000));
    assert!(result.success);
    assert_eq!(
        state.get_storage(OTHER, slot(0)).unwrap(),
        StorageValue::ZERO
    );
    assert_eq!(
        state.get_storage(CONTRACT, slot(0)).unwrap(),
        StorageValue::from_word(U256::from(7))
    );
}

// =============================================================================
// DEPTH AND VALUE RULES
// =============================================================================

#[test]
fn test_call_beyond_depth_limit_fails_returning_gas() {
    let mut state = setup(&[0x00]);
    let mut message = call_message(50_000);
    message.depth = 1_025;
    let result = run(&mut state, message);
    assert!(!result.success);
    assert_eq!(result.gas_left, 50_000);
    assert_eq!(result.gas_used, 0);
    assert_eq!(result.error, Some(VmError::CallDepthExceeded { depth: 1_025 }));
}

#[test]
fn test_frame_at_depth_limit_runs_but_spawns_nothing() {
    // A frame at depth 1024 executes; the CALL it issues would land at
    // 1025 and is refused, so the child's write never happens and the
    // returned flag word is zero.
    let child_code = [0x60, 0x01, 0x60, 0x00, 0x55, 0x00]; // SSTORE(0, 1)
    let mut caller_code = call_snippet(OTHER);
    caller_code.extend_from_slice(&[
        0x60, 0x00, 0x52, // MSTORE flag at 0
        0x60, 0x20, 0x60, 0x00, 0xF3, // RETURN(0, 32)
    ]);

    let mut state = setup(&caller_code);
    state.create_contract(OTHER, U256::zero(), &child_code);

    let mut message = call_message(200_000);
    message.depth = 1_024;
    let result = run(&mut state, message);
    assert!(result.success);
    assert_eq!(result.output.as_slice(), &[0u8; 32]);
    assert_eq!(
        state.get_storage(OTHER, slot(0)).unwrap(),
        StorageValue::ZERO
    );
}

#[test]
fn test_value_transfer_to_codeless_account() {
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(500));
    let message =
        Message::transaction_call(CALLER, OTHER, U256::from(123), Bytes::new(), 50_000);
    let result = run(&mut state, message);
    assert!(result.success);
    assert_eq!(result.gas_used, 0);
    assert_eq!(
        state.get_account(OTHER).unwrap().unwrap().balance,
        U256::from(123)
    );
    assert_eq!(
        state.get_account(CALLER).unwrap().unwrap().balance,
        U256::from(377)
    );
}

#[test]
fn test_insufficient_balance_fails_without_burning_gas() {
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(10));
    let message =
        Message::transaction_call(CALLER, OTHER, U256::from(100), Bytes::new(), 50_000);
    let result = run(&mut state, message);
    assert!(!result.success);
    assert_eq!(result.gas_left, 50_000);
    assert!(matches!(
        result.error,
        Some(VmError::InsufficientBalance { .. })
    ));
    assert!(state.get_account(OTHER).unwrap().is_none());
}

// =============================================================================
// CREATE
// =============================================================================

#[test]
fn test_top_level_create_deploys_code() {
    // Init code: MSTORE8(0, 0xFE), RETURN(0, 1) -> deploys [0xFE].
    let init = [
        0x60, 0xFE, 0x60, 0x00, 0x53, // MSTORE8
        0x60, 0x01, 0x60, 0x00, 0xF3, // RETURN(0, 1)
    ];
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(1_000));

    let message = Message::transaction_create(
        CALLER,
        U256::from(55),
        Bytes::copy_from_slice(&init),
        100_000,
    );
    let result = run(&mut state, message);
    assert!(result.success);

    let expected = create_address(CALLER, 0);
    assert_eq!(result.created_address, Some(expected));
    assert_eq!(result.output.as_slice(), &[0xFE]);

    let deployed = state.get_account(expected).unwrap().unwrap();
    assert_eq!(deployed.balance, U256::from(55));
    assert_eq!(deployed.nonce, 1);
    assert_eq!(&*state.get_code(expected).unwrap(), &[0xFE]);
    // Creator's nonce moved.
    assert_eq!(state.get_account(CALLER).unwrap().unwrap().nonce, 1);
}

#[test]
fn test_create_reverting_init_keeps_nonce_bump() {
    let init = [0x60, 0x00, 0x60, 0x00, 0xFD]; // REVERT(0, 0)
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(1_000));

    let message =
        Message::transaction_create(CALLER, U256::zero(), Bytes::copy_from_slice(&init), 100_000);
    let result = run(&mut state, message);
    assert!(!result.success);
    assert_eq!(result.created_address, None);
    assert!(result.gas_left > 0);

    let expected = create_address(CALLER, 0);
    assert!(state.get_account(expected).unwrap().is_none());
    assert_eq!(state.get_account(CALLER).unwrap().unwrap().nonce, 1);
}

#[test]
fn test_create_rejects_ef_prefixed_code() {
    // Init code deploying [0xEF]: MSTORE8(0, 0xEF), RETURN(0, 1).
    let init = [
        0x60, 0xEF, 0x60, 0x00, 0x53, 0x60, 0x01, 0x60, 0x00, 0xF3,
    ];
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(1_000));

    let message =
        Message::transaction_create(CALLER, U256::zero(), Bytes::copy_from_slice(&init), 100_000);
    let result = run(&mut state, message);
    assert!(!result.success);
    assert_eq!(result.gas_left, 0);
    assert_eq!(result.error, Some(VmError::InvalidCodePrefix));
}

#[test]
fn test_oversized_init_code_rejected() {
    let init = vec![0x00u8; 49_153];
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(1_000));

    let message =
        Message::transaction_create(CALLER, U256::zero(), Bytes(init), 1_000_000);
    let result = run(&mut state, message);
    assert!(!result.success);
    assert!(matches!(
        result.error,
        Some(VmError::InitCodeSizeExceeded { .. })
    ));
}

// =============================================================================
// STATIC CONTEXT
// =============================================================================

#[test]
fn test_staticcall_blocks_child_writes() {
    // Child: SSTORE(0, 1). Caller STATICCALLs it and returns the success
    // flag word.
    let child_code = [0x60, 0x01, 0x60, 0x00, 0x55, 0x00];
    let mut caller_code = vec![
        0x60, 0x00, // retSize
        0x60, 0x00, // retOffset
        0x60, 0x00, // argsSize
        0x60, 0x00, // argsOffset
        0x73, // PUSH20 target
    ];
    caller_code.extend_from_slice(OTHER.as_bytes());
    caller_code.extend_from_slice(&[
        0x61, 0xFF, 0xFF, 0xFA, // PUSH2 0xFFFF, STATICCALL
        0x60, 0x00, 0x52, // MSTORE flag at 0
        0x60, 0x20, 0x60, 0x00, 0xF3, // RETURN(0, 32)
    ]);

    let mut state = setup(&caller_code);
    state.create_contract(OTHER, U256::zero(), &child_code);

    let result = run(&mut state, call_message(200_000));
    assert!(result.success);
    // Child failed, so the flag word is zero.
    assert_eq!(result.output.as_slice(), &[0u8; 32]);
    assert_eq!(
        state.get_storage(OTHER, slot(0)).unwrap(),
        StorageValue::ZERO
    );
}

// =============================================================================
// SELFDESTRUCT
// =============================================================================

#[test]
fn test_selfdestruct_refund_not_blocked_by_reverted_claim() {
    // OTHER selfdestructs to the zero address. HELPER calls it and then
    // reverts, discarding that destruction along with its refund claim.
    // The caller then destroys OTHER for real; on Berlin the committed
    // destruction must still earn its 24000 refund.
    let victim_code = [0x60, 0x00, 0xFF]; // PUSH1 0, SELFDESTRUCT
    let mut reverter_code = call_snippet(OTHER);
    reverter_code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0xFD]); // REVERT(0, 0)
    let mut caller_code = call_snippet(HELPER);
    caller_code.extend_from_slice(&call_snippet(OTHER));
    caller_code.push(0x00);

    let mut state = setup(&caller_code);
    state.create_contract(OTHER, U256::zero(), &victim_code);
    state.create_contract(HELPER, U256::zero(), &reverter_code);

    let result = run_with_config(
        &mut state,
        call_message(200_000),
        &mut NoopTracer,
        &ForkConfig::new(Fork::Berlin),
    );
    assert!(result.success);
    assert!(result.gas_refund > 0);
    assert_eq!(result.gas_refund, (result.gas_used / 2).min(24_000));
    assert!(!state.account_exists(OTHER).unwrap());
}

// =============================================================================
// TRANSIENT STORAGE
// =============================================================================

#[test]
fn test_transient_store_and_load_within_frame() {
    // TSTORE(1, 0x2A), TLOAD(1), MSTORE at 0, RETURN(0, 32).
    let code = [
        0x60, 0x2A, 0x60, 0x01, 0x5D, // TSTORE
        0x60, 0x01, 0x5C, // TLOAD
        0x60, 0x00, 0x52, // MSTORE
        0x60, 0x20, 0x60, 0x00, 0xF3, // RETURN
    ];
    let mut state = setup(&code);
    let result = run(&mut state, call_message(100_000));
    assert!(result.success);
    assert_eq!(result.output.as_slice()[31], 0x2A);
    // Nothing landed in persistent storage.
    assert_eq!(
        state.get_storage(CONTRACT, slot(1)).unwrap(),
        StorageValue::ZERO
    );
}

// =============================================================================
// PRECOMPILES
// =============================================================================

#[test]
fn test_identity_precompile_via_message() {
    let mut state = InMemoryState::new();
    state.create_account(CALLER, U256::from(1_000));
    let mut target = [0u8; 20];
    target[19] = 0x04;
    let message = Message::transaction_call(
        CALLER,
        Address::new(target),
        U256::zero(),
        Bytes::copy_from_slice(&[1, 2, 3]),
        50_000,
    );
    let result = run(&mut state, message);
    assert!(result.success);
    assert_eq!(result.output.as_slice(), &[1, 2, 3]);
    assert_eq!(result.gas_used, 18);
}

// =============================================================================
// TRACING
// =============================================================================

#[test]
fn test_tracer_sees_every_instruction() {
    let mut state = setup(&[0x60, 0x01, 0x60, 0x01, 0x01, 0x00]);
    let mut tracer = RecordingTracer::new();
    let result = run_traced(&mut state, call_message(100_000), &mut tracer);
    assert!(result.success);
    assert_eq!(
        tracer.opcodes(),
        vec![Opcode::Push1, Opcode::Push1, Opcode::Add, Opcode::Stop]
    );
}
