use evm_frame_core::utils::u256_to_h256;
use evm_frame_core::{ExceptionalHaltReason, Gas, GasOverflow, Host, MessageFrame, Opcode};

use super::{peek, Instruction, InstructionTable};

pub fn register(table: &mut InstructionTable<'_>) {
	table.put(table.instruction(Opcode::SLOAD, "SLOAD", 1, 1, sload_cost, |_, frame, host| {
		let index = frame.stack_mut().pop_h256()?;
		let value = host.storage(frame.address(), index);
		frame.stack_mut().push_h256(value)?;
		Ok(())
	}));
	table.put(
		table
			.instruction(Opcode::SSTORE, "SSTORE", 2, 0, sstore_cost, |i, frame, host| {
				let index = frame.stack_mut().pop_h256()?;
				let new = frame.stack_mut().pop_h256()?;
				let address = frame.address();

				let original = host.original_storage(address, index);
				let current = host.storage(address, index);
				frame.increment_gas_refund(i.calculator().sstore_refund(original, current, new));
				host.set_storage(address, index, new);
				Ok(())
			})
			.with_halt(sstore_halt),
	);
}

fn sload_cost(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().sload_operation_gas_cost())
}

fn sstore_cost(i: &Instruction, frame: &MessageFrame, host: &dyn Host) -> Result<Gas, GasOverflow> {
	let address = frame.address();
	let index = u256_to_h256(peek(frame, 0));
	let new = u256_to_h256(peek(frame, 1));

	Ok(i.calculator().sstore_operation_gas_cost(
		host.original_storage(address, index),
		host.storage(address, index),
		new,
	))
}

fn sstore_halt(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Option<ExceptionalHaltReason> {
	if let Some(sentry) = i.calculator().sstore_sentry_gas() {
		if frame.remaining_gas() <= sentry {
			return Some(ExceptionalHaltReason::InsufficientGas);
		}
	}

	if frame.is_static() {
		return Some(ExceptionalHaltReason::IllegalStateChange);
	}

	None
}

#[cfg(test)]
mod tests {
	use crate::backend::{MemoryBackend, OverlayedBackend};
	use crate::{Config, Evm, NoTracer};
	use evm_frame_core::{
		Code, ExceptionalHaltReason, ExitError, Gas, Host, MessageFrame, State,
	};
	use primitive_types::{H160, H256};

	const CONTRACT: H160 = H160([0x11; 20]);

	fn frame(code: &str, gas: u64, is_static: bool) -> MessageFrame {
		MessageFrame::builder()
			.code(Code::from_bytes(hex::decode(code).unwrap()))
			.initial_gas(Gas::new(gas))
			.address(CONTRACT)
			.is_static(is_static)
			.build()
	}

	#[test]
	fn sstore_net_metering_and_refund() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		// PUSH1 0x01 PUSH1 0x00 SSTORE PUSH1 0x00 PUSH1 0x00 SSTORE
		let mut frame = frame("60016000556000600055", 50_000, false);
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();

		assert_eq!(frame.state(), State::CodeSuccess);
		assert_eq!(host.storage(CONTRACT, H256::zero()), H256::zero());
		// Fresh slot set then restored: 20000 + 800, refund 19200.
		assert_eq!(frame.remaining_gas(), Gas::new(50_000 - 4 * 3 - 20_000 - 800));
		assert_eq!(frame.gas_refund(), 19_200);
	}

	#[test]
	fn sstore_refused_under_stipend() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = frame("6001600055", 2_306, false);
		let result = evm.run_to_halt(&mut frame, &mut host, &mut NoTracer);

		assert_eq!(result, Err(ExitError::Exception(ExceptionalHaltReason::InsufficientGas)));
		assert_eq!(host.storage(CONTRACT, H256::zero()), H256::zero());
	}

	#[test]
	fn sstore_in_static_context() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = frame("6001600055", 50_000, true);
		let result = evm.run_to_halt(&mut frame, &mut host, &mut NoTracer);

		assert_eq!(
			result,
			Err(ExitError::Exception(ExceptionalHaltReason::IllegalStateChange))
		);
	}

	#[test]
	fn sload_reads_storage() {
		let evm = Evm::new(&Config::frontier());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		host.set_storage(CONTRACT, H256::zero(), H256::from_low_u64_be(7));
		// PUSH1 0x00 SLOAD
		let mut frame = frame("600054", 100, false);
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();

		assert_eq!(frame.stack_item(0), Ok(7.into()));
		assert_eq!(frame.remaining_gas(), Gas::new(100 - 3 - 50));
	}
}
