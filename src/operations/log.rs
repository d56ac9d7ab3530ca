use alloc::vec::Vec;
use evm_frame_core::{
	ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, Log, MessageFrame, Opcode,
	Operation,
};

use super::{check_memory, memory_range, peek, Instruction, InstructionTable};

const LOG_NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];

pub fn register(table: &mut InstructionTable<'_>) {
	for (n, name) in LOG_NAMES.into_iter().enumerate() {
		let opcode = Opcode(Opcode::LOG0.as_u8() + n as u8);
		table.put(
			table
				.instruction(opcode, name, n + 2, 0, log_cost, log)
				.with_halt(log_halt),
		);
	}
}

fn topic_count(i: &Instruction) -> u8 {
	i.opcode().as_u8() - Opcode::LOG0.as_u8()
}

fn log_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	i.calculator().log_operation_gas_cost(
		frame.memory().active_words(),
		peek(frame, 0),
		peek(frame, 1),
		topic_count(i),
	)
}

fn log_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	if frame.is_static() {
		return Some(ExceptionalHaltReason::IllegalStateChange);
	}
	check_memory(frame, peek(frame, 0), peek(frame, 1))
}

fn log(i: &Instruction, frame: &mut MessageFrame, _: &mut dyn Host) -> Result<(), ExitFatal> {
	let offset = frame.pop_stack_item()?;
	let len = frame.pop_stack_item()?;
	let (offset, len) = memory_range(offset, len)?;

	let mut topics = Vec::with_capacity(usize::from(topic_count(i)));
	for _ in 0..topic_count(i) {
		topics.push(frame.stack_mut().pop_h256()?);
	}

	let data = frame.memory_mut().get(offset, len);
	let address = frame.address();
	frame.add_log(Log {
		address,
		topics,
		data,
	});
	Ok(())
}
