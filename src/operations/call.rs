//! Message calls. A call operation only describes the child message and
//! suspends its frame; the message processor runs the child and resumes
//! the frame with the outcome.

use core::cmp::max;

use evm_frame_core::utils::u256_to_h160;
use evm_frame_core::{
	CallKind, ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, MessageFrame,
	MessageRequest, Opcode, Operation,
};
use primitive_types::U256;

use super::{check_memory, memory_range, peek, Instruction, InstructionTable};
use crate::Config;

pub fn register(table: &mut InstructionTable<'_>, config: &Config) {
	table.put(
		table
			.instruction(Opcode::CALL, "CALL", 7, 1, call_cost, call)
			.with_halt(call_halt),
	);
	if config.eip7_delegate_call {
		table.put(
			table
				.instruction(Opcode::DELEGATECALL, "DELEGATECALL", 6, 1, call_cost, call)
				.with_halt(call_halt),
		);
	}
	if config.eip214_static_call {
		table.put(
			table
				.instruction(Opcode::STATICCALL, "STATICCALL", 6, 1, call_cost, call)
				.with_halt(call_halt),
		);
	}
}

fn call_kind(i: &Instruction) -> CallKind {
	match i.opcode() {
		Opcode::DELEGATECALL => CallKind::DelegateCall,
		Opcode::STATICCALL => CallKind::StaticCall,
		_ => CallKind::Call,
	}
}

/// Stack position of the input offset. Only `CALL` carries a value operand.
fn input_index(kind: CallKind) -> usize {
	match kind {
		CallKind::Call => 3,
		CallKind::DelegateCall | CallKind::StaticCall => 2,
	}
}

fn value_operand(kind: CallKind, frame: &MessageFrame) -> U256 {
	match kind {
		CallKind::Call => peek(frame, 2),
		CallKind::DelegateCall | CallKind::StaticCall => U256::zero(),
	}
}

/// Cost of the call itself, without the gas forwarded to the child.
fn base_cost(i: &Instruction, frame: &MessageFrame, host: &dyn Host) -> Result<Gas, GasOverflow> {
	let kind = call_kind(i);
	let first = input_index(kind);
	let calculator = i.calculator();
	let active_words = frame.memory().active_words();

	let input = calculator.memory_expansion_gas_cost(
		active_words,
		peek(frame, first),
		peek(frame, first + 1),
	)?;
	let output = calculator.memory_expansion_gas_cost(
		active_words,
		peek(frame, first + 2),
		peek(frame, first + 3),
	)?;

	let transfers_value = !value_operand(kind, frame).is_zero();
	let recipient_is_new = kind == CallKind::Call && {
		let target = u256_to_h160(peek(frame, 1));
		if calculator.schedule().empty_considered_exists {
			!host.exists(target)
		} else {
			host.is_empty(target)
		}
	};

	calculator.call_operation_gas_cost(max(input, output), transfers_value, recipient_is_new)
}

fn call_cost(i: &Instruction, frame: &MessageFrame, host: &dyn Host) -> Result<Gas, GasOverflow> {
	let base = base_cost(i, frame, host)?;
	let remaining = frame.remaining_gas().saturating_sub(base);
	let child = i
		.calculator()
		.gas_available_for_child_call(remaining, peek(frame, 0))?;
	base.checked_add(child)
}

fn call_halt(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	let kind = call_kind(i);
	if frame.is_static() && !value_operand(kind, frame).is_zero() {
		return Some(ExceptionalHaltReason::IllegalStateChange);
	}

	let first = input_index(kind);
	check_memory(frame, peek(frame, first), peek(frame, first + 1))
		.or_else(|| check_memory(frame, peek(frame, first + 2), peek(frame, first + 3)))
}

fn call(i: &Instruction, frame: &mut MessageFrame, host: &mut dyn Host) -> Result<(), ExitFatal> {
	let kind = call_kind(i);

	// What was charged on top of the call's own cost is the child's share.
	let charged = frame.current_gas_cost().ok_or(ExitFatal::GasCostUnavailable)?;
	let base = base_cost(i, frame, &*host).map_err(|_| ExitFatal::GasCostUnavailable)?;
	let mut gas = charged
		.checked_sub(base)
		.map_err(|_| ExitFatal::GasCostUnavailable)?;

	frame.pop_stack_item()?;
	let to = u256_to_h160(frame.pop_stack_item()?);
	let value = match kind {
		CallKind::Call => frame.pop_stack_item()?,
		CallKind::DelegateCall | CallKind::StaticCall => U256::zero(),
	};
	let in_offset = frame.pop_stack_item()?;
	let in_len = frame.pop_stack_item()?;
	let out_offset = frame.pop_stack_item()?;
	let out_len = frame.pop_stack_item()?;
	let (in_offset, in_len) = memory_range(in_offset, in_len)?;
	let (output_offset, output_len) = memory_range(out_offset, out_len)?;

	frame.memory_mut().expand(output_offset, output_len);
	let input = frame.memory_mut().get(in_offset, in_len);

	if !value.is_zero() {
		gas = gas
			.checked_add(i.calculator().additional_call_stipend())
			.map_err(|_| ExitFatal::GasAccountingOverflow)?;
	}

	let request = match kind {
		CallKind::Call => MessageRequest {
			kind,
			gas,
			address: to,
			code_address: to,
			caller: frame.address(),
			transfer_value: value,
			apparent_value: value,
			input,
			is_static: frame.is_static(),
			output_offset,
			output_len,
		},
		CallKind::DelegateCall => MessageRequest {
			kind,
			gas,
			address: frame.address(),
			code_address: to,
			caller: frame.caller(),
			transfer_value: U256::zero(),
			apparent_value: frame.value(),
			input,
			is_static: frame.is_static(),
			output_offset,
			output_len,
		},
		CallKind::StaticCall => MessageRequest {
			kind,
			gas,
			address: to,
			code_address: to,
			caller: frame.address(),
			transfer_value: U256::zero(),
			apparent_value: U256::zero(),
			input,
			is_static: true,
			output_offset,
			output_len,
		},
	};

	log::trace!(target: "evm", "{:?} to {:?} with {} gas", kind, request.code_address, gas);
	frame.suspend(request);
	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::backend::{MemoryAccount, MemoryBackend, OverlayedBackend};
	use crate::{Config, Evm, NoTracer};
	use evm_frame_core::{
		CallKind, Code, ExceptionalHaltReason, ExitError, Gas, MessageFrame, State,
	};
	use primitive_types::{H160, U256};

	const CALLER: H160 = H160([0x01; 20]);
	const CONTRACT: H160 = H160([0x02; 20]);

	fn frame(code: &str, is_static: bool) -> MessageFrame {
		MessageFrame::builder()
			.code(Code::from_bytes(hex::decode(code).unwrap()))
			.initial_gas(Gas::new(100_000))
			.address(CONTRACT)
			.caller(CALLER)
			.value(U256::from(9))
			.is_static(is_static)
			.build()
	}

	#[test]
	fn call_suspends_with_request() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		// PUSH1 0x20 PUSH1 0x00 PUSH1 0x00 PUSH1 0x00 PUSH1 0x00 PUSH1 0x42 PUSH2 0xffff CALL
		let mut frame = frame("60206000600060006000604261fffff1", false);
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();

		assert_eq!(frame.state(), State::CodeSuspended);
		assert_eq!(frame.pc(), 15);
		assert_eq!(frame.memory().len(), 32);

		let request = frame.pending_message().unwrap();
		assert_eq!(request.kind, CallKind::Call);
		assert_eq!(request.address, H160::from_low_u64_be(0x42));
		assert_eq!(request.caller, CONTRACT);
		assert_eq!(request.gas, Gas::new(0xffff));
		assert_eq!((request.output_offset, request.output_len), (0, 32));

		// Seven pushes, the call with one word of output memory and the
		// forwarded gas.
		assert_eq!(frame.remaining_gas(), Gas::new(100_000 - 7 * 3 - 703 - 0xffff));
	}

	#[test]
	fn delegatecall_keeps_context() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		// PUSH1 0x00 PUSH1 0x00 PUSH1 0x00 PUSH1 0x00 PUSH1 0x42 PUSH1 0x10 DELEGATECALL
		let mut frame = frame("600060006000600060426010f4", false);
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();

		let request = frame.pending_message().unwrap();
		assert_eq!(request.kind, CallKind::DelegateCall);
		assert_eq!(request.address, CONTRACT);
		assert_eq!(request.code_address, H160::from_low_u64_be(0x42));
		assert_eq!(request.caller, CALLER);
		assert_eq!(request.apparent_value, U256::from(9));
		assert_eq!(request.transfer_value, U256::zero());
		assert_eq!(request.gas, Gas::new(0x10));
	}

	#[test]
	fn value_transfer_in_static_context_is_illegal() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		// PUSH1 0x00 x4, PUSH1 0x01 (value), PUSH1 0x42, PUSH1 0x10, CALL
		let mut frame = frame("6000600060006000600160426010f1", true);
		assert_eq!(
			evm.run_to_halt(&mut frame, &mut host, &mut NoTracer),
			Err(ExitError::Exception(ExceptionalHaltReason::IllegalStateChange))
		);
	}

	#[test]
	fn value_call_to_empty_account_pays_for_creation_after_eip161() {
		let mut backend = MemoryBackend::default();
		backend.insert_account(H160::from_low_u64_be(0x42), MemoryAccount::default());
		let mut host = OverlayedBackend::new(backend);
		// PUSH1 0x00 x4, PUSH1 0x01 (value), PUSH1 0x42, PUSH1 0x10, CALL
		let code = "6000600060006000600160426010f1";

		let mut istanbul = frame(code, false);
		Evm::new(&Config::istanbul())
			.run_to_halt(&mut istanbul, &mut host, &mut NoTracer)
			.unwrap();
		assert_eq!(istanbul.state(), State::CodeSuspended);
		assert_eq!(
			istanbul.remaining_gas(),
			Gas::new(100_000 - 7 * 3 - 700 - 9_000 - 25_000 - 0x10)
		);

		// Before EIP-161 the account merely has to exist.
		let mut frontier = frame(code, false);
		Evm::new(&Config::frontier())
			.run_to_halt(&mut frontier, &mut host, &mut NoTracer)
			.unwrap();
		assert_eq!(frontier.remaining_gas(), Gas::new(100_000 - 7 * 3 - 40 - 9_000 - 0x10));
	}
}
