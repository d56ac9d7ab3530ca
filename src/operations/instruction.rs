use alloc::sync::Arc;
use core::fmt;

use evm_frame_core::{
	ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, MessageFrame, Opcode, Operation,
};
use evm_frame_gasometer::GasCalculator;

/// Gas charged by an instruction.
pub type CostFn = fn(&Instruction, &MessageFrame, &dyn Host) -> Result<Gas, GasOverflow>;
/// Halt condition beyond the generic stack and gas checks.
pub type HaltFn = fn(&Instruction, &MessageFrame, &dyn Host) -> Option<ExceptionalHaltReason>;
/// Effect of an instruction.
pub type ExecuteFn = fn(&Instruction, &mut MessageFrame, &mut dyn Host) -> Result<(), ExitFatal>;

/// An entry of the instruction table: static shape plus function pointers,
/// bound to the fee schedule it is priced under.
pub struct Instruction {
	opcode: Opcode,
	name: &'static str,
	consumed: usize,
	produced: usize,
	size: usize,
	updates_pc: bool,
	cost: CostFn,
	halt: Option<HaltFn>,
	execute: ExecuteFn,
	calculator: Arc<dyn GasCalculator>,
}

impl Instruction {
	pub fn new(
		opcode: Opcode,
		name: &'static str,
		consumed: usize,
		produced: usize,
		calculator: Arc<dyn GasCalculator>,
		cost: CostFn,
		execute: ExecuteFn,
	) -> Self {
		Self {
			opcode,
			name,
			consumed,
			produced,
			size: 1,
			updates_pc: false,
			cost,
			halt: None,
			execute,
			calculator,
		}
	}

	/// Encoded length, immediates included.
	pub fn with_size(mut self, size: usize) -> Self {
		self.size = size;
		self
	}

	/// The effect positions the program counter itself.
	pub fn with_pc_update(mut self) -> Self {
		self.updates_pc = true;
		self
	}

	pub fn with_halt(mut self, halt: HaltFn) -> Self {
		self.halt = Some(halt);
		self
	}

	pub fn calculator(&self) -> &dyn GasCalculator {
		&*self.calculator
	}

	pub fn into_operation(self) -> Arc<dyn Operation> {
		Arc::new(self)
	}
}

impl fmt::Debug for Instruction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instruction")
			.field("opcode", &self.opcode)
			.field("name", &self.name)
			.field("consumed", &self.consumed)
			.field("produced", &self.produced)
			.field("size", &self.size)
			.finish()
	}
}

impl Operation for Instruction {
	fn opcode(&self) -> Opcode {
		self.opcode
	}

	fn name(&self) -> &'static str {
		self.name
	}

	fn stack_items_consumed(&self) -> usize {
		self.consumed
	}

	fn stack_items_produced(&self) -> usize {
		self.produced
	}

	fn op_size(&self) -> usize {
		self.size
	}

	fn updates_program_counter(&self) -> bool {
		self.updates_pc
	}

	fn cost(&self, frame: &MessageFrame, host: &dyn Host) -> Result<Gas, GasOverflow> {
		(self.cost)(self, frame, host)
	}

	fn exceptional_halt_condition(
		&self,
		frame: &MessageFrame,
		host: &dyn Host,
	) -> Option<ExceptionalHaltReason> {
		self.halt.and_then(|halt| halt(self, frame, host))
	}

	fn execute(&self, frame: &mut MessageFrame, host: &mut dyn Host) -> Result<(), ExitFatal> {
		(self.execute)(self, frame, host)
	}
}

/// Placeholder for opcodes that are not mapped under a code version, and
/// the designated `INVALID` instruction. Always halts.
#[derive(Clone, Debug, Default)]
pub struct InvalidOperation;

impl Operation for InvalidOperation {
	fn opcode(&self) -> Opcode {
		Opcode::INVALID
	}

	fn name(&self) -> &'static str {
		"INVALID"
	}

	fn stack_items_consumed(&self) -> usize {
		0
	}

	fn stack_items_produced(&self) -> usize {
		0
	}

	fn cost(&self, _frame: &MessageFrame, _host: &dyn Host) -> Result<Gas, GasOverflow> {
		Ok(Gas::ZERO)
	}

	fn exceptional_halt_condition(
		&self,
		_frame: &MessageFrame,
		_host: &dyn Host,
	) -> Option<ExceptionalHaltReason> {
		Some(ExceptionalHaltReason::InvalidOperation)
	}

	fn execute(&self, _frame: &mut MessageFrame, _host: &mut dyn Host) -> Result<(), ExitFatal> {
		Err(ExitFatal::UncheckedHalt(ExceptionalHaltReason::InvalidOperation))
	}
}

/// An operation that does not exist in the code, such as the implicit
/// `STOP` past the last byte.
#[derive(Debug)]
pub struct VirtualOperation {
	delegate: Arc<dyn Operation>,
}

impl VirtualOperation {
	pub fn new(delegate: Arc<dyn Operation>) -> Self {
		Self { delegate }
	}
}

impl Operation for VirtualOperation {
	fn opcode(&self) -> Opcode {
		self.delegate.opcode()
	}

	fn name(&self) -> &'static str {
		self.delegate.name()
	}

	fn stack_items_consumed(&self) -> usize {
		self.delegate.stack_items_consumed()
	}

	fn stack_items_produced(&self) -> usize {
		self.delegate.stack_items_produced()
	}

	fn op_size(&self) -> usize {
		self.delegate.op_size()
	}

	fn updates_program_counter(&self) -> bool {
		self.delegate.updates_program_counter()
	}

	fn is_virtual(&self) -> bool {
		true
	}

	fn cost(&self, frame: &MessageFrame, host: &dyn Host) -> Result<Gas, GasOverflow> {
		self.delegate.cost(frame, host)
	}

	fn exceptional_halt_condition(
		&self,
		frame: &MessageFrame,
		host: &dyn Host,
	) -> Option<ExceptionalHaltReason> {
		self.delegate.exceptional_halt_condition(frame, host)
	}

	fn execute(&self, frame: &mut MessageFrame, host: &mut dyn Host) -> Result<(), ExitFatal> {
		self.delegate.execute(frame, host)
	}
}
