use evm_frame_core::utils::u256_to_usize;
use evm_frame_core::{ExceptionalHaltReason, Gas, GasOverflow, Host, MessageFrame, Opcode};
use primitive_types::U256;

use super::{as_usize, base_tier, high_tier, mid_tier, peek, Instruction, InstructionTable};

pub fn register(table: &mut InstructionTable<'_>) {
	table.put(
		table
			.instruction(Opcode::JUMP, "JUMP", 1, 0, mid_tier, |_, frame, _| {
				let dest = as_usize(frame.pop_stack_item()?)?;
				frame.set_pc(dest);
				Ok(())
			})
			.with_pc_update()
			.with_halt(|_, frame, _| check_jump_destination(frame, peek(frame, 0))),
	);
	table.put(
		table
			.instruction(Opcode::JUMPI, "JUMPI", 2, 0, high_tier, |_, frame, _| {
				let dest = frame.pop_stack_item()?;
				let condition = frame.pop_stack_item()?;
				if condition.is_zero() {
					frame.set_pc(frame.pc() + 1);
				} else {
					frame.set_pc(as_usize(dest)?);
				}
				Ok(())
			})
			.with_pc_update()
			.with_halt(|_, frame, _| {
				if peek(frame, 1).is_zero() {
					None
				} else {
					check_jump_destination(frame, peek(frame, 0))
				}
			}),
	);
	table.put(table.instruction(Opcode::PC, "PC", 0, 1, base_tier, |_, frame, _| {
		let pc = U256::from(frame.pc());
		frame.push_stack_item(pc)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::GAS, "GAS", 0, 1, base_tier, |_, frame, _| {
		let gas = frame.remaining_gas().as_u256();
		frame.push_stack_item(gas)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::JUMPDEST, "JUMPDEST", 0, 0, jumpdest_cost, |_, _, _| Ok(())));
}

fn jumpdest_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().jump_dest_operation_gas_cost())
}

fn check_jump_destination(frame: &MessageFrame, dest: U256) -> Option<ExceptionalHaltReason> {
	match u256_to_usize(dest) {
		Some(dest) if frame.code().is_valid_jump_destination(dest) => None,
		_ => Some(ExceptionalHaltReason::InvalidJumpDestination),
	}
}

#[cfg(test)]
mod tests {
	use crate::backend::{MemoryBackend, OverlayedBackend};
	use crate::{Config, Evm, NoTracer};
	use evm_frame_core::{Code, ExceptionalHaltReason, ExitError, Gas, MessageFrame, State};
	use primitive_types::U256;

	fn run(code: &str) -> (MessageFrame, Result<(), ExitError>) {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = MessageFrame::builder()
			.code(Code::from_bytes(hex::decode(code).unwrap()))
			.initial_gas(Gas::new(1_000))
			.build();
		let result = evm.run_to_halt(&mut frame, &mut host, &mut NoTracer);
		(frame, result)
	}

	#[test]
	fn jump_lands_on_jumpdest() {
		// PUSH1 0x04 JUMP INVALID JUMPDEST PUSH1 0x01
		let (frame, result) = run("600456fe5b6001");
		assert_eq!(result, Ok(()));
		assert_eq!(frame.state(), State::CodeSuccess);
		assert_eq!(frame.stack_item(0), Ok(U256::one()));
	}

	#[test]
	fn jump_into_push_data_halts() {
		// PUSH1 0x04 JUMP PUSH1 0x5b
		let (frame, result) = run("600456605b");
		assert_eq!(
			result,
			Err(ExitError::Exception(ExceptionalHaltReason::InvalidJumpDestination))
		);
		assert_eq!(frame.state(), State::ExceptionalHalt);
	}

	#[test]
	fn jumpi_falls_through_on_zero() {
		// PUSH1 0x00 PUSH1 0xff JUMPI PC
		let (frame, result) = run("600060ff5758");
		assert_eq!(result, Ok(()));
		assert_eq!(frame.stack_item(0), Ok(U256::from(5)));
	}
}
