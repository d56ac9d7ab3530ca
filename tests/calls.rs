use evm_frame::backend::{Backend, MemoryAccount, MemoryBackend, OverlayedBackend};
use evm_frame::{
	Code, Config, Evm, ExceptionalHaltReason, Gas, MessageFrame, MessageProcessor, NoTracer,
	Opcode, State, TransactionOutcome,
};
use primitive_types::{H160, H256, U256};

const ORIGIN: H160 = H160([0x01; 20]);
const CALLER: H160 = H160([0xaa; 20]);
const CALLEE: H160 = H160([0xbb; 20]);

const GAS: u64 = 1_000_000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Bytecode for a call-class `opcode` to `to` forwarding `0xffff` gas, with
/// empty input and `out_len` bytes of output at offset 0.
fn call(opcode: Opcode, to: H160, value: Option<u8>, out_len: u8) -> Vec<u8> {
	let mut code = vec![0x60, out_len, 0x60, 0x00, 0x60, 0x00, 0x60, 0x00];
	if let Some(value) = value {
		code.extend_from_slice(&[0x60, value]);
	}
	// PUSH20 to
	code.push(0x73);
	code.extend_from_slice(to.as_bytes());
	code.extend_from_slice(&[0x61, 0xff, 0xff, opcode.as_u8()]);
	code
}

/// `PUSH1 slot SSTORE`: store the top of the stack.
fn store_top(slot: u8) -> Vec<u8> {
	vec![0x60, slot, Opcode::SSTORE.as_u8()]
}

/// `PUSH1 0x20 PUSH1 0x00 RETURN`.
fn return_word() -> Vec<u8> {
	vec![0x60, 0x20, 0x60, 0x00, Opcode::RETURN.as_u8()]
}

fn account(code: Vec<u8>, balance: u64) -> MemoryAccount {
	MemoryAccount {
		balance: U256::from(balance),
		code,
		..Default::default()
	}
}

/// Run the code of `CALLER` against a world holding `caller` and `callee`.
fn process(
	config: &Config,
	caller: MemoryAccount,
	callee: MemoryAccount,
) -> (TransactionOutcome, MemoryBackend) {
	let mut backend = MemoryBackend::default();
	let code = Code::from_bytes(caller.code.clone());
	backend.insert_account(CALLER, caller);
	backend.insert_account(CALLEE, callee);

	let evm = Evm::new(config);
	let mut host = OverlayedBackend::new(backend);
	let frame = MessageFrame::builder()
		.code(code)
		.initial_gas(Gas::new(GAS))
		.address(CALLER)
		.caller(ORIGIN)
		.origin(ORIGIN)
		.build();

	let outcome = MessageProcessor::new(&evm, config)
		.process(frame, &mut host, &mut NoTracer)
		.unwrap();
	let (mut backend, changes) = host.deconstruct();
	backend.apply(changes);
	(outcome, backend)
}

fn slot(n: u64) -> H256 {
	H256::from_low_u64_be(n)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn child_output_and_storage_are_kept() {
	// PUSH1 0x2a PUSH1 0x00 SSTORE PUSH1 0x2a PUSH1 0x00 MSTORE, return it
	let mut callee = hex::decode("602a600055602a600052").unwrap();
	callee.extend(return_word());

	let mut caller = call(Opcode::CALL, CALLEE, Some(0), 0x20);
	caller.extend(store_top(1));
	caller.extend(return_word());

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 0), account(callee, 0));

	assert!(outcome.is_success());
	assert_eq!(U256::from_big_endian(&outcome.output), U256::from(0x2a));
	assert_eq!(backend.storage(CALLEE, slot(0)), slot(0x2a));
	assert_eq!(backend.storage(CALLER, slot(1)), slot(1));
}

#[test]
fn reverted_child_keeps_return_data_only() {
	// SSTORE 0x2a at 0, then REVERT with one byte 0xff
	let callee = hex::decode("602a60005560ff60005360016000fd").unwrap();

	let mut caller = call(Opcode::CALL, CALLEE, Some(0), 0x00);
	caller.extend(store_top(1));
	caller.push(Opcode::RETURNDATASIZE.as_u8());
	caller.extend(store_top(2));

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 0), account(callee, 0));

	assert!(outcome.is_success());
	assert_eq!(backend.storage(CALLEE, slot(0)), H256::zero());
	assert_eq!(backend.storage(CALLER, slot(1)), H256::zero());
	assert_eq!(backend.storage(CALLER, slot(2)), slot(1));
}

#[test]
fn halted_child_consumes_forwarded_gas() {
	let mut caller = call(Opcode::CALL, CALLEE, Some(0), 0x00);
	caller.extend(store_top(1));

	let (outcome, _) = process(&Config::istanbul(), account(caller, 0), account(vec![0xfe], 0));

	assert!(outcome.is_success());
	assert!(outcome.remaining_gas < Gas::new(GAS - 0xffff));
}

#[test]
fn call_beyond_depth_limit_returns_gas() {
	let mut config = Config::istanbul();
	config.call_stack_limit = 0;

	let mut caller = call(Opcode::CALL, CALLEE, Some(0), 0x20);
	caller.extend(store_top(1));
	caller.extend(return_word());

	let (outcome, backend) = process(&config, account(caller, 0), account(vec![0x00], 0));

	assert!(outcome.is_success());
	assert_eq!(backend.storage(CALLER, slot(1)), H256::zero());
	// Seven pushes, CALL with one word of memory, the slot push and a no-op
	// SSTORE, then the RETURN operands. The forwarded gas came back.
	assert_eq!(outcome.remaining_gas, Gas::new(GAS - 21 - 703 - 3 - 800 - 6));
}

#[test]
fn value_transfer_without_funds_fails_the_call() {
	let mut caller = call(Opcode::CALL, CALLEE, Some(1), 0x00);
	caller.extend(store_top(1));

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 0), account(vec![0x00], 0));

	assert!(outcome.is_success());
	assert_eq!(backend.balance(CALLEE), U256::zero());
	assert_eq!(backend.storage(CALLER, slot(1)), H256::zero());
	// Seven pushes, the value-bearing CALL, the slot push and a no-op SSTORE.
	// The stipend comes back with the forwarded gas.
	assert_eq!(outcome.remaining_gas, Gas::new(GAS - 21 - 9_700 + 2_300 - 3 - 800));
}

#[test]
fn value_is_transferred() {
	let mut caller = call(Opcode::CALL, CALLEE, Some(7), 0x00);
	caller.extend(store_top(1));

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 10), account(vec![0x00], 0));

	assert!(outcome.is_success());
	assert_eq!(backend.balance(CALLER), U256::from(3));
	assert_eq!(backend.balance(CALLEE), U256::from(7));
	assert_eq!(backend.storage(CALLER, slot(1)), slot(1));
}

#[test]
fn staticcall_child_cannot_write() {
	let callee = hex::decode("602a600055").unwrap();
	let mut caller = call(Opcode::STATICCALL, CALLEE, None, 0x00);
	caller.extend(store_top(1));

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 0), account(callee, 0));

	assert!(outcome.is_success());
	assert_eq!(backend.storage(CALLEE, slot(0)), H256::zero());
	assert_eq!(backend.storage(CALLER, slot(1)), H256::zero());
}

#[test]
fn delegatecall_runs_in_caller_context() {
	let callee = hex::decode("602a600055").unwrap();
	let mut caller = call(Opcode::DELEGATECALL, CALLEE, None, 0x00);
	caller.extend(store_top(1));

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 0), account(callee, 0));

	assert!(outcome.is_success());
	assert_eq!(backend.storage(CALLER, slot(0)), slot(0x2a));
	assert_eq!(backend.storage(CALLEE, slot(0)), H256::zero());
}

#[test]
fn logs_follow_the_outcome() {
	// PUSH1 0x00 PUSH1 0x00 LOG0
	let callee = hex::decode("60006000a0").unwrap();
	let caller = call(Opcode::CALL, CALLEE, Some(0), 0x00);
	let (outcome, _) = process(&Config::istanbul(), account(caller, 0), account(callee.clone(), 0));
	assert_eq!(outcome.logs.len(), 1);
	assert_eq!(outcome.logs[0].address, CALLEE);

	// Same log, then REVERT.
	let mut reverting = callee;
	reverting.extend(hex::decode("60006000fd").unwrap());
	let caller = call(Opcode::CALL, CALLEE, Some(0), 0x00);
	let (outcome, _) = process(&Config::istanbul(), account(caller, 0), account(reverting, 0));
	assert!(outcome.is_success());
	assert!(outcome.logs.is_empty());
}

#[test]
fn top_level_revert_discards_changes() {
	// SSTORE 0x2a at 0, then REVERT
	let caller = hex::decode("602a60005560006000fd").unwrap();

	let (outcome, backend) = process(&Config::istanbul(), account(caller, 0), account(vec![], 0));

	assert_eq!(outcome.state, State::Revert);
	assert!(outcome.remaining_gas > Gas::ZERO);
	assert_eq!(backend.storage(CALLER, slot(0)), H256::zero());
}

#[test]
fn top_level_halt_reports_reason() {
	let (outcome, _) = process(&Config::istanbul(), account(vec![0x56], 0), account(vec![], 0));

	assert_eq!(outcome.state, State::ExceptionalHalt);
	assert_eq!(outcome.halt_reason, Some(ExceptionalHaltReason::InsufficientStackItems));
	assert_eq!(outcome.remaining_gas, Gas::ZERO);
}

#[test]
fn recursion_stops_at_the_depth_limit() {
	let mut config = Config::istanbul();
	config.call_stack_limit = 8;

	// The callee calls itself with all it can, counting depth in slot 0.
	// PUSH1 0x01 PUSH1 0x00 SLOAD ADD PUSH1 0x00 SSTORE, then the call.
	let mut callee = hex::decode("6001600054016000556000600060006000600073").unwrap();
	callee.extend_from_slice(CALLEE.as_bytes());
	callee.extend(hex::decode("5af1").unwrap());

	let caller = call(Opcode::CALL, CALLEE, Some(0), 0x00);
	let (outcome, backend) = process(&config, account(caller, 0), account(callee, 0));

	assert!(outcome.is_success());
	assert_eq!(backend.storage(CALLEE, slot(0)), slot(8));
}
