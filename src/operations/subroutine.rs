//! `BEGINSUB`, `JUMPSUB` and `RETURNSUB`: subroutines with a dedicated
//! return stack.

use evm_frame_core::utils::u256_to_usize;
use evm_frame_core::{ExceptionalHaltReason, Gas, GasOverflow, Host, MessageFrame, Opcode};

use super::{as_usize, peek, Instruction, InstructionTable};

pub fn register(table: &mut InstructionTable<'_>) {
	table.put(table.instruction(Opcode::BEGINSUB, "BEGINSUB", 0, 0, begin_sub_cost, |_, _, _| {
		Ok(())
	}));
	table.put(
		table
			.instruction(Opcode::JUMPSUB, "JUMPSUB", 1, 0, jump_sub_cost, |_, frame, _| {
				let location = as_usize(frame.pop_stack_item()?)?;
				let return_pc = frame.pc() + 1;
				frame.return_stack_mut().push(return_pc)?;
				frame.set_pc(location + 1);
				Ok(())
			})
			.with_pc_update()
			.with_halt(jump_sub_halt),
	);
	table.put(
		table
			.instruction(Opcode::RETURNSUB, "RETURNSUB", 0, 0, ret_sub_cost, |_, frame, _| {
				let return_pc = frame.return_stack_mut().pop()?;
				frame.set_pc(return_pc);
				Ok(())
			})
			.with_pc_update()
			.with_halt(|_, frame, _| {
				if frame.return_stack().is_empty() {
					Some(ExceptionalHaltReason::InvalidRetsub)
				} else {
					None
				}
			}),
	);
}

fn begin_sub_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().begin_sub_gas_cost())
}

fn jump_sub_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().jump_sub_gas_cost())
}

fn ret_sub_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().ret_sub_gas_cost())
}

fn jump_sub_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	let valid = match u256_to_usize(peek(frame, 0)) {
		Some(location) => frame.code().is_valid_begin_sub(location),
		None => false,
	};
	if !valid {
		return Some(ExceptionalHaltReason::InvalidJumpDestination);
	}
	if frame.return_stack().is_full() {
		return Some(ExceptionalHaltReason::TooManyReturnStackItems);
	}
	None
}

#[cfg(test)]
mod tests {
	use crate::backend::{MemoryBackend, OverlayedBackend};
	use crate::{Config, Evm, NoTracer};
	use evm_frame_core::{Code, ExceptionalHaltReason, ExitError, Gas, MessageFrame, State};
	use primitive_types::U256;

	fn frame(code: &str) -> MessageFrame {
		MessageFrame::builder()
			.code(Code::from_bytes(hex::decode(code).unwrap()))
			.initial_gas(Gas::new(100))
			.build()
	}

	#[test]
	fn jump_into_subroutine_and_back() {
		let evm = Evm::new(&Config::berlin());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		// PUSH1 0x04 JUMPSUB STOP BEGINSUB RETURNSUB
		let mut frame = frame("60045e005c5d");
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();

		assert_eq!(frame.state(), State::CodeSuccess);
		assert_eq!(frame.pc(), 3);
		assert!(frame.return_stack().is_empty());
		// BEGINSUB itself is jumped over.
		assert_eq!(frame.remaining_gas(), Gas::new(100 - 3 - 10 - 5));
	}

	#[test]
	fn jumpsub_requires_beginsub_target() {
		let evm = Evm::new(&Config::berlin());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		// PUSH1 0x03 JUMPSUB JUMPDEST
		let mut frame = frame("60035e5b");
		assert_eq!(
			evm.run_to_halt(&mut frame, &mut host, &mut NoTracer),
			Err(ExitError::Exception(ExceptionalHaltReason::InvalidJumpDestination))
		);
	}

	#[test]
	fn returnsub_with_empty_return_stack() {
		let evm = Evm::new(&Config::berlin());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = frame("5d");
		assert_eq!(
			evm.run_to_halt(&mut frame, &mut host, &mut NoTracer),
			Err(ExitError::Exception(ExceptionalHaltReason::InvalidRetsub))
		);
		assert_eq!(frame.remaining_gas(), Gas::new(100));
	}

	#[test]
	fn jumpsub_with_full_return_stack() {
		let evm = Evm::new(&Config::berlin());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = MessageFrame::builder()
			.code(Code::from_bytes(hex::decode("60045e005c").unwrap()))
			.initial_gas(Gas::new(100))
			.max_return_stack_size(0)
			.build();
		assert_eq!(
			evm.run_to_halt(&mut frame, &mut host, &mut NoTracer),
			Err(ExitError::Exception(ExceptionalHaltReason::TooManyReturnStackItems))
		);
		assert_eq!(frame.stack_item(0), Ok(U256::from(4)));
	}

	#[test]
	fn subroutines_are_invalid_before_berlin() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = frame("5c");
		assert_eq!(
			evm.run_to_halt(&mut frame, &mut host, &mut NoTracer),
			Err(ExitError::Exception(ExceptionalHaltReason::InvalidOperation))
		);
	}
}
