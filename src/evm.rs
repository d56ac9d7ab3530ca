use alloc::sync::Arc;
use evm_frame_core::{
	Code, ExceptionalHaltReason, ExitError, ExitFatal, Gas, GasOverflow, Host, MessageFrame,
	Operation, State,
};
use evm_frame_gasometer::GasCalculator;

use crate::operations::{self, InvalidOperation, VirtualOperation};
use crate::{Config, OperationRegistry, OperationTracer};

/// Outcome of a single interpreter step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
	/// The frame is still executing.
	Continue,
	/// The step ended the frame with an exceptional halt.
	Halt(ExceptionalHaltReason),
	/// The frame left `CODE_EXECUTING` through the operation itself.
	Terminal(State),
}

/// The interpreter: dispatches the operations of a registry over a frame.
pub struct Evm {
	registry: OperationRegistry,
	calculator: Arc<dyn GasCalculator>,
	end_of_code: Arc<dyn Operation>,
	invalid: Arc<dyn Operation>,
}

impl Evm {
	/// Interpreter for the instruction set and fee schedule of `config`.
	pub fn new(config: &Config) -> Self {
		Self::with_registry(config.operation_registry(), config.gas_calculator())
	}

	pub fn with_registry(registry: OperationRegistry, calculator: Arc<dyn GasCalculator>) -> Self {
		let stop = operations::stop(calculator.clone()).into_operation();
		Self {
			registry,
			calculator,
			end_of_code: Arc::new(VirtualOperation::new(stop)),
			invalid: Arc::new(InvalidOperation),
		}
	}

	pub fn registry(&self) -> &OperationRegistry {
		&self.registry
	}

	pub fn gas_calculator(&self) -> &dyn GasCalculator {
		&*self.calculator
	}

	/// Operation at `pc`. Past the end of the code this is the implicit
	/// `STOP`, and an unmapped opcode resolves to the invalid operation.
	pub fn operation_at_offset(&self, code: &Code, pc: usize) -> &Arc<dyn Operation> {
		match code.get(pc) {
			Some(opcode) => self
				.registry
				.get_or_default(opcode, code.version(), &self.invalid),
			None => &self.end_of_code,
		}
	}

	/// Walk `code` in operation order, skipping push data.
	pub fn for_each_operation<F: FnMut(&dyn Operation, usize)>(&self, code: &Code, mut f: F) {
		let mut pc = 0;
		while pc < code.size() {
			let operation = self.operation_at_offset(code, pc);
			f(&**operation, pc);
			pc += operation.op_size();
		}
	}

	/// Run the frame until it leaves `CODE_EXECUTING`.
	///
	/// Success, revert and suspension return `Ok`; the frame state tells them
	/// apart. An exceptional halt is returned as `ExitError::Exception`.
	pub fn run_to_halt(
		&self,
		frame: &mut MessageFrame,
		host: &mut dyn Host,
		tracer: &mut dyn OperationTracer,
	) -> Result<(), ExitError> {
		if frame.state() != State::CodeExecuting {
			return Err(ExitFatal::NotExecuting.into());
		}

		loop {
			match self.execute_next_operation(frame, host, tracer)? {
				Step::Continue => (),
				Step::Halt(reason) => return Err(ExitError::Exception(reason)),
				Step::Terminal(_) => return Ok(()),
			}
		}
	}

	/// Execute exactly one operation.
	pub fn execute_next_operation(
		&self,
		frame: &mut MessageFrame,
		host: &mut dyn Host,
		tracer: &mut dyn OperationTracer,
	) -> Result<Step, ExitFatal> {
		if frame.state() != State::CodeExecuting {
			return Err(ExitFatal::NotExecuting);
		}
		let operation = self.operation_at_offset(frame.code(), frame.pc()).clone();
		frame.set_current_operation(operation.clone());

		let (halt, gas_cost) = self.check_exceptional_halt(frame, &*operation, &*host);

		if log::log_enabled!(target: "evm", log::Level::Trace) {
			log::trace!(
				target: "evm",
				"depth {} pc {} {} cost {:?} gas {} stack {:?}",
				frame.depth(),
				frame.pc(),
				operation.name(),
				gas_cost.map(|cost| cost.as_u64()),
				frame.remaining_gas(),
				frame.stack().data(),
			);
		}

		tracer.trace_execution(frame, &*operation, gas_cost);
		event!(Event::Step {
			depth: frame.depth(),
			pc: frame.pc(),
			opcode: operation.opcode(),
			gas_cost,
			remaining_gas: frame.remaining_gas(),
			stack: frame.stack(),
			memory: frame.memory(),
		});

		let step = match halt {
			Some(reason) => {
				log::debug!(
					target: "evm",
					"exceptional halt at depth {} pc {} ({}): {}",
					frame.depth(),
					frame.pc(),
					operation.name(),
					reason,
				);
				event!(Event::Halt {
					depth: frame.depth(),
					pc: frame.pc(),
					reason,
				});
				frame.set_exceptional_halt(reason);
				Step::Halt(reason)
			}
			None => match self.apply(frame, host, &*operation, gas_cost) {
				Ok(step) => step,
				Err(fatal) => {
					log::debug!(target: "evm", "{} failed at pc {}: {}", operation.name(), frame.pc(), fatal);
					frame.set_state(State::CompletedFailed)?;
					return Err(fatal);
				}
			},
		};

		tracer.trace_post_execution(frame, &step);
		Ok(step)
	}

	/// Halt reason for running `operation` on `frame`, if any, together with
	/// its cost when that could be computed. Checks run in a fixed order and
	/// the first failure wins: stack overflow, stack underflow, gas, then the
	/// operation's own condition.
	pub fn check_exceptional_halt(
		&self,
		frame: &MessageFrame,
		operation: &dyn Operation,
		host: &dyn Host,
	) -> (Option<ExceptionalHaltReason>, Option<Gas>) {
		let stack_size = frame.stack_size();
		let mut halt = if stack_size as isize + operation.stack_size_change()
			> frame.max_stack_size() as isize
		{
			Some(ExceptionalHaltReason::TooManyStackItems)
		} else if stack_size < operation.stack_items_consumed() {
			Some(ExceptionalHaltReason::InsufficientStackItems)
		} else {
			None
		};

		// Cost reads stack items, so it is left unknown on underflow. Any other
		// pending halt still gets a cost for tracers.
		let cost: Option<Result<Gas, GasOverflow>> =
			if halt == Some(ExceptionalHaltReason::InsufficientStackItems) {
				None
			} else {
				Some(operation.cost(frame, host))
			};

		if halt.is_none() {
			halt = match cost {
				Some(Err(_)) => Some(ExceptionalHaltReason::GasCostOverflow),
				Some(Ok(cost)) if cost > frame.remaining_gas() => {
					Some(ExceptionalHaltReason::InsufficientGas)
				}
				_ => None,
			};
		}
		if halt.is_none() {
			halt = operation.exceptional_halt_condition(frame, host);
		}

		(halt, cost.and_then(Result::ok))
	}

	fn apply(
		&self,
		frame: &mut MessageFrame,
		host: &mut dyn Host,
		operation: &dyn Operation,
		gas_cost: Option<Gas>,
	) -> Result<Step, ExitFatal> {
		let cost = gas_cost.ok_or(ExitFatal::GasCostUnavailable)?;
		frame.set_current_gas_cost(Some(cost));
		frame
			.decrement_remaining_gas(cost)
			.map_err(|_| ExitFatal::UncheckedHalt(ExceptionalHaltReason::InsufficientGas))?;

		operation.execute(frame, host)?;

		if frame.state() == State::CodeExecuting && !operation.updates_program_counter() {
			frame.set_pc(frame.pc() + operation.op_size());
		}

		Ok(match (frame.state(), frame.exceptional_halt_reason()) {
			(State::CodeExecuting, _) => Step::Continue,
			(State::ExceptionalHalt, Some(reason)) => Step::Halt(reason),
			(state, _) => Step::Terminal(state),
		})
	}
}

impl core::fmt::Debug for Evm {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Evm")
			.field("registry", &self.registry)
			.field("calculator", &self.calculator)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{MemoryBackend, OverlayedBackend};
	use crate::{NoTracer, StructLogTracer};
	use evm_frame_core::Opcode;
	use primitive_types::U256;

	fn frame(code: &[u8], gas: u64) -> MessageFrame {
		MessageFrame::builder()
			.code(Code::from_bytes(code.to_vec()))
			.initial_gas(Gas::new(gas))
			.build()
	}

	#[test]
	fn end_of_code_is_virtual_stop() {
		let evm = Evm::new(&Config::istanbul());
		let code = Code::from_bytes(vec![0x01]);
		let op = evm.operation_at_offset(&code, 5);
		assert!(op.is_virtual());
		assert_eq!(op.opcode(), Opcode::STOP);
		assert!(Arc::ptr_eq(op, evm.operation_at_offset(&code, 1)));
	}

	#[test]
	fn unmapped_opcode_is_invalid() {
		let evm = Evm::new(&Config::istanbul());
		let code = Code::from_bytes(vec![0x0c]);
		let op = evm.operation_at_offset(&code, 0);
		let host = OverlayedBackend::new(MemoryBackend::default());
		assert_eq!(op.opcode(), Opcode::INVALID);
		assert_eq!(op.cost(&frame(&[], 0), &host), Ok(Gas::ZERO));
	}

	#[test]
	fn for_each_operation_skips_push_data() {
		let evm = Evm::new(&Config::istanbul());
		// PUSH2 0x5b5b JUMPDEST ADD
		let code = Code::from_bytes(hex::decode("615b5b5b01").unwrap());
		let mut seen = Vec::new();
		evm.for_each_operation(&code, |op, pc| seen.push((pc, op.name())));
		assert_eq!(seen, vec![(0, "PUSH2"), (3, "JUMPDEST"), (4, "ADD")]);
	}

	#[test]
	fn stack_overflow_wins_over_gas() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = MessageFrame::builder()
			.code(Code::from_bytes(vec![0x60, 0x01]))
			.initial_gas(Gas::new(1))
			.max_stack_size(1)
			.build();
		frame.push_stack_item(U256::one()).unwrap();
		let mut tracer = StructLogTracer::new();

		let step = evm.execute_next_operation(&mut frame, &mut host, &mut tracer);
		assert_eq!(step, Ok(Step::Halt(ExceptionalHaltReason::TooManyStackItems)));
		// The cost is still computed for tracers, and nothing was charged
		// before the halt.
		assert_eq!(tracer.logs()[0].gas_cost, Some(Gas::new(3)));
		assert_eq!(tracer.logs()[0].gas, Gas::new(1));
		assert_eq!(tracer.logs()[0].halt_reason, Some(ExceptionalHaltReason::TooManyStackItems));
		assert_eq!(frame.stack_size(), 1);
		assert_eq!(frame.remaining_gas(), Gas::new(1));
	}

	#[test]
	fn run_to_halt_refuses_finished_frame() {
		let evm = Evm::new(&Config::istanbul());
		let mut host = OverlayedBackend::new(MemoryBackend::default());
		let mut frame = frame(&[0x00], 10);
		evm.run_to_halt(&mut frame, &mut host, &mut NoTracer).unwrap();
		assert_eq!(
			evm.run_to_halt(&mut frame, &mut host, &mut NoTracer),
			Err(ExitError::Fatal(ExitFatal::NotExecuting))
		);
	}
}
