use evm_frame_core::utils::{h160_to_u256, h256_to_u256};
use evm_frame_core::{Gas, GasOverflow, Host, MessageFrame, Opcode};
use primitive_types::U256;

use super::{base_tier, Instruction, InstructionTable};
use crate::Config;

/// How far back `BLOCKHASH` can see.
const BLOCK_HASH_WINDOW: u64 = 256;

pub fn register(table: &mut InstructionTable<'_>, config: &Config) {
	table.put(table.instruction(Opcode::BLOCKHASH, "BLOCKHASH", 1, 1, blockhash_cost, |_, frame, host| {
		let number = frame.pop_stack_item()?;
		let current = frame.block_values().number;

		let hash = if number >= current || current - number > U256::from(BLOCK_HASH_WINDOW) {
			U256::zero()
		} else {
			h256_to_u256(host.block_hash(number))
		};
		frame.push_stack_item(hash)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::COINBASE, "COINBASE", 0, 1, base_tier, |_, frame, _| {
		let coinbase = h160_to_u256(frame.block_values().coinbase);
		frame.push_stack_item(coinbase)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::TIMESTAMP, "TIMESTAMP", 0, 1, base_tier, |_, frame, _| {
		let timestamp = frame.block_values().timestamp;
		frame.push_stack_item(timestamp)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::NUMBER, "NUMBER", 0, 1, base_tier, |_, frame, _| {
		let number = frame.block_values().number;
		frame.push_stack_item(number)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::DIFFICULTY, "DIFFICULTY", 0, 1, base_tier, |_, frame, _| {
		let difficulty = frame.block_values().difficulty;
		frame.push_stack_item(difficulty)?;
		Ok(())
	}));
	table.put(table.instruction(Opcode::GASLIMIT, "GASLIMIT", 0, 1, base_tier, |_, frame, _| {
		let gas_limit = frame.block_values().gas_limit;
		frame.push_stack_item(gas_limit)?;
		Ok(())
	}));

	if config.eip1344_chain_id {
		table.put(table.instruction(Opcode::CHAINID, "CHAINID", 0, 1, base_tier, |_, frame, _| {
			let chain_id = frame.block_values().chain_id;
			frame.push_stack_item(chain_id)?;
			Ok(())
		}));
	}

	if config.eip1884_self_balance {
		table.put(table.instruction(
			Opcode::SELFBALANCE,
			"SELFBALANCE",
			0,
			1,
			selfbalance_cost,
			|_, frame, host| {
				let balance = host.balance(frame.address());
				frame.push_stack_item(balance)?;
				Ok(())
			},
		));
	}

	if config.eip3198_base_fee {
		table.put(table.instruction(Opcode::BASEFEE, "BASEFEE", 0, 1, base_tier, |_, frame, _| {
			let base_fee = frame.block_values().base_fee;
			frame.push_stack_item(base_fee)?;
			Ok(())
		}));
	}
}

fn blockhash_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().block_hash_operation_gas_cost())
}

fn selfbalance_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().self_balance_operation_gas_cost())
}
