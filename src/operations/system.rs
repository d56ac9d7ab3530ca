use alloc::sync::Arc;
use alloc::vec::Vec;
use evm_frame_core::{
	ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, MessageFrame, Opcode, State,
};
use evm_frame_gasometer::GasCalculator;

use super::{
	check_memory, memory_range, peek, zero_tier, Instruction, InstructionTable, InvalidOperation,
};
use crate::Config;

/// `STOP`, also what runs past the end of the code.
pub fn stop(calculator: Arc<dyn GasCalculator>) -> Instruction {
	Instruction::new(Opcode::STOP, "STOP", 0, 0, calculator, zero_tier, |_, frame, _| {
		frame.set_output_data(Vec::new());
		frame.set_state(State::CodeSuccess)
	})
}

pub fn register(table: &mut InstructionTable<'_>, config: &Config) {
	table.put(stop(table.calculator()));
	table.put(
		table
			.instruction(Opcode::RETURN, "RETURN", 2, 0, return_cost, |_, frame, _| {
				let output = pop_output(frame)?;
				frame.set_output_data(output);
				frame.set_state(State::CodeSuccess)
			})
			.with_halt(return_halt),
	);

	if config.eip140_revert {
		table.put(
			table
				.instruction(Opcode::REVERT, "REVERT", 2, 0, return_cost, |_, frame, _| {
					let output = pop_output(frame)?;
					frame.set_output_data(output);
					frame.set_state(State::Revert)
				})
				.with_halt(return_halt),
		);
	}

	table.put_operation(Arc::new(InvalidOperation));
}

fn pop_output(frame: &mut MessageFrame) -> Result<Vec<u8>, ExitFatal> {
	let offset = frame.pop_stack_item()?;
	let len = frame.pop_stack_item()?;
	let (offset, len) = memory_range(offset, len)?;
	Ok(frame.memory_mut().get(offset, len))
}

fn return_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	let calculator = i.calculator();
	calculator.zero_tier_gas_cost().checked_add(calculator.memory_expansion_gas_cost(
		frame.memory().active_words(),
		peek(frame, 0),
		peek(frame, 1),
	)?)
}

fn return_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	check_memory(frame, peek(frame, 0), peek(frame, 1))
}
