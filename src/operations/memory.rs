use evm_frame_core::{ExceptionalHaltReason, Gas, GasOverflow, Host, MessageFrame, Opcode};
use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

use super::{as_usize, base_tier, check_memory, memory_range, peek, Instruction, InstructionTable};

pub fn register(table: &mut InstructionTable<'_>) {
	table.put(
		table
			.instruction(Opcode::MLOAD, "MLOAD", 1, 1, word_cost, |_, frame, _| {
				let offset = as_usize(frame.pop_stack_item()?)?;
				let value = frame.memory_mut().get_word(offset);
				frame.stack_mut().push_h256(value)?;
				Ok(())
			})
			.with_halt(word_halt),
	);
	table.put(
		table
			.instruction(Opcode::MSTORE, "MSTORE", 2, 0, word_cost, |_, frame, _| {
				let offset = as_usize(frame.pop_stack_item()?)?;
				let value = frame.stack_mut().pop_h256()?;
				frame.memory_mut().set(offset, &value[..], Some(32));
				Ok(())
			})
			.with_halt(word_halt),
	);
	table.put(
		table
			.instruction(Opcode::MSTORE8, "MSTORE8", 2, 0, byte_cost, |_, frame, _| {
				let offset = as_usize(frame.pop_stack_item()?)?;
				let value = (frame.pop_stack_item()?.low_u32() & 0xff) as u8;
				frame.memory_mut().set(offset, &[value], Some(1));
				Ok(())
			})
			.with_halt(byte_halt),
	);
	table.put(table.instruction(Opcode::MSIZE, "MSIZE", 0, 1, base_tier, |_, frame, _| {
		let size = U256::from(frame.memory().len());
		frame.push_stack_item(size)?;
		Ok(())
	}));
	table.put(
		table
			.instruction(Opcode::SHA3, "SHA3", 2, 1, sha3_cost, |_, frame, _| {
				let offset = frame.pop_stack_item()?;
				let len = frame.pop_stack_item()?;
				let (offset, len) = memory_range(offset, len)?;

				let data = frame.memory_mut().get(offset, len);
				let hash = H256::from_slice(Keccak256::digest(&data).as_slice());
				frame.stack_mut().push_h256(hash)?;
				Ok(())
			})
			.with_halt(range_halt),
	);
}

fn word_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	i.calculator()
		.memory_operation_gas_cost(frame.memory().active_words(), peek(frame, 0), U256::from(32))
}

fn byte_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	i.calculator()
		.memory_operation_gas_cost(frame.memory().active_words(), peek(frame, 0), U256::one())
}

fn sha3_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	i.calculator()
		.sha3_operation_gas_cost(frame.memory().active_words(), peek(frame, 0), peek(frame, 1))
}

fn word_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	check_memory(frame, peek(frame, 0), U256::from(32))
}

fn byte_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	check_memory(frame, peek(frame, 0), U256::one())
}

fn range_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	check_memory(frame, peek(frame, 0), peek(frame, 1))
}
