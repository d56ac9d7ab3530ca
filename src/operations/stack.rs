use evm_frame_core::{Opcode, Operation};
use primitive_types::U256;

use super::{base_tier, very_low_tier, InstructionTable};

const PUSH_NAMES: [&str; 32] = [
	"PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
	"PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
	"PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
	"PUSH29", "PUSH30", "PUSH31", "PUSH32",
];

const DUP_NAMES: [&str; 16] = [
	"DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
	"DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
];

const SWAP_NAMES: [&str; 16] = [
	"SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
	"SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
];

pub fn register(table: &mut InstructionTable<'_>) {
	table.put(table.instruction(Opcode::POP, "POP", 1, 0, base_tier, |_, frame, _| {
		frame.pop_stack_item()?;
		Ok(())
	}));

	for (n, name) in PUSH_NAMES.into_iter().enumerate() {
		let opcode = Opcode(Opcode::PUSH1.as_u8() + n as u8);
		table.put(
			table
				.instruction(opcode, name, 0, 1, very_low_tier, |i, frame, _| {
					let data = frame.code().push_data(frame.pc(), i.op_size() - 1);
					frame.push_stack_item(U256::from_big_endian(&data))?;
					Ok(())
				})
				.with_size(n + 2),
		);
	}

	for (n, name) in DUP_NAMES.into_iter().enumerate() {
		let opcode = Opcode(Opcode::DUP1.as_u8() + n as u8);
		table.put(table.instruction(opcode, name, n + 1, n + 2, very_low_tier, |i, frame, _| {
			let n = usize::from(i.opcode().as_u8() - Opcode::DUP1.as_u8()) + 1;
			frame.stack_mut().dup(n)?;
			Ok(())
		}));
	}

	for (n, name) in SWAP_NAMES.into_iter().enumerate() {
		let opcode = Opcode(Opcode::SWAP1.as_u8() + n as u8);
		table.put(table.instruction(opcode, name, n + 2, n + 2, very_low_tier, |i, frame, _| {
			let n = usize::from(i.opcode().as_u8() - Opcode::SWAP1.as_u8()) + 1;
			frame.stack_mut().swap(n)?;
			Ok(())
		}));
	}
}

#[cfg(test)]
mod tests {
	use crate::backend::{MemoryBackend, OverlayedBackend};
	use crate::{Config, Evm, NoTracer};
	use evm_frame_core::{Code, Gas, MessageFrame, State};
	use primitive_types::U256;

	fn run(code: &str) -> MessageFrame {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = MessageFrame::builder()
			.code(Code::from_bytes(hex::decode(code).unwrap()))
			.initial_gas(Gas::new(1_000))
			.build();
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();
		assert_eq!(frame.state(), State::CodeSuccess);
		frame
	}

	#[test]
	fn push_dup_swap() {
		// PUSH1 0x01 PUSH2 0x0203 DUP2 SWAP2
		let frame = run("6001610203819100");
		assert_eq!(frame.stack().data(), &vec![U256::one(), U256::from(0x0203), U256::one()]);
		assert_eq!(frame.pc(), 7);
	}

	#[test]
	fn truncated_push_is_zero_padded() {
		// PUSH3 0xaa <end>
		let frame = run("62aa");
		assert_eq!(frame.stack_item(0), Ok(U256::from(0xaa0000)));
	}
}
