use evm_frame_core::utils::{h160_to_u256, u256_to_h160, u256_to_usize};
use evm_frame_core::{
	ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, MessageFrame, Opcode,
};
use primitive_types::{H256, U256};

use super::{base_tier, check_memory, memory_range, peek, very_low_tier, Instruction, InstructionTable};
use crate::Config;

pub fn register(table: &mut InstructionTable<'_>, config: &Config) {
	table.put(table.instruction(Opcode::ADDRESS, "ADDRESS", 0, 1, base_tier, |_, frame, _| {
		let address = h160_to_u256(frame.address());
		frame.push_stack_item(address)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::BALANCE, "BALANCE", 1, 1, balance_cost, |_, frame, host| {
		let address = u256_to_h160(frame.pop_stack_item()?);
		frame.push_stack_item(host.balance(address))?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::ORIGIN, "ORIGIN", 0, 1, base_tier, |_, frame, _| {
		let origin = h160_to_u256(frame.origin());
		frame.push_stack_item(origin)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::CALLER, "CALLER", 0, 1, base_tier, |_, frame, _| {
		let caller = h160_to_u256(frame.caller());
		frame.push_stack_item(caller)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::CALLVALUE, "CALLVALUE", 0, 1, base_tier, |_, frame, _| {
		let value = frame.value();
		frame.push_stack_item(value)?;
		Ok(())
	}));
	table.put(table.instruction(
		Opcode::CALLDATALOAD,
		"CALLDATALOAD",
		1,
		1,
		very_low_tier,
		calldataload,
	));
	table.put(table.instruction(
		Opcode::CALLDATASIZE,
		"CALLDATASIZE",
		0,
		1,
		base_tier,
		|_, frame, _| {
			let size = U256::from(frame.input().len());
			frame.push_stack_item(size)?;
			Ok(())
		},
	));
	table.put(
		table
			.instruction(Opcode::CALLDATACOPY, "CALLDATACOPY", 3, 0, copy_cost, |_, frame, _| {
				let data = frame.shared_input();
				copy_to_memory(frame, &data)
			})
			.with_halt(copy_halt),
	);
	table.put(table.instruction(Opcode::CODESIZE, "CODESIZE", 0, 1, base_tier, |_, frame, _| {
		let size = U256::from(frame.code().size());
		frame.push_stack_item(size)?;
		Ok(())
	}));
	table.put(
		table
			.instruction(Opcode::CODECOPY, "CODECOPY", 3, 0, copy_cost, |_, frame, _| {
				let code = frame.code().clone();
				copy_to_memory(frame, code.bytes())
			})
			.with_halt(copy_halt),
	);
	table.put(table.instruction(Opcode::GASPRICE, "GASPRICE", 0, 1, base_tier, |_, frame, _| {
		let gas_price = frame.gas_price();
		frame.push_stack_item(gas_price)?;
		Ok(())
	}));

	if config.eip211_return_data {
		table.put(table.instruction(
			Opcode::RETURNDATASIZE,
			"RETURNDATASIZE",
			0,
			1,
			base_tier,
			|_, frame, _| {
				let size = U256::from(frame.return_data().len());
				frame.push_stack_item(size)?;
				Ok(())
			},
		));
		table.put(
			table
				.instruction(
					Opcode::RETURNDATACOPY,
					"RETURNDATACOPY",
					3,
					0,
					copy_cost,
					|_, frame, _| {
						let data = frame.shared_return_data();
						copy_to_memory(frame, &data)
					},
				)
				.with_halt(returndatacopy_halt),
		);
	}
}

fn balance_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().balance_operation_gas_cost())
}

fn calldataload(_: &Instruction, frame: &mut MessageFrame, _: &mut dyn Host) -> Result<(), ExitFatal> {
	let index = frame.pop_stack_item()?;

	let mut load = [0u8; 32];
	for (i, byte) in load.iter_mut().enumerate() {
		if let Some(p) = index.checked_add(U256::from(i)) {
			if let Some(b) = u256_to_usize(p).and_then(|p| frame.input().get(p)) {
				*byte = *b;
			}
		}
	}

	frame.stack_mut().push_h256(H256::from(load))?;
	Ok(())
}

/// Shared by the three `*COPY` opcodes: `memory_offset, data_offset, len`.
fn copy_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	i.calculator().data_copy_operation_gas_cost(
		frame.memory().active_words(),
		peek(frame, 0),
		peek(frame, 2),
	)
}

fn copy_halt(_: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	check_memory(frame, peek(frame, 0), peek(frame, 2))
}

fn returndatacopy_halt(
	i: &Instruction,
	frame: &MessageFrame,
	host: &dyn Host,
) -> Option<ExceptionalHaltReason> {
	let data_offset = peek(frame, 1);
	let len = peek(frame, 2);
	match data_offset.checked_add(len) {
		Some(end) if end <= U256::from(frame.return_data().len()) => copy_halt(i, frame, host),
		_ => Some(ExceptionalHaltReason::InvalidReturnDataBufferAccess),
	}
}

fn copy_to_memory(frame: &mut MessageFrame, data: &[u8]) -> Result<(), ExitFatal> {
	let memory_offset = frame.pop_stack_item()?;
	let data_offset = frame.pop_stack_item()?;
	let len = frame.pop_stack_item()?;

	let (memory_offset, len) = memory_range(memory_offset, len)?;
	frame
		.memory_mut()
		.copy_large(memory_offset, data_offset, len, data);
	Ok(())
}
