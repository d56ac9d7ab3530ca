//! The instruction set.
//!
//! Every opcode is an [`Instruction`] table entry: its stack shape plus
//! function pointers for cost, extra halt condition and effect. Entries are
//! grouped by concern and registered per code version through an
//! [`InstructionTable`].

mod arithmetic;
mod bitwise;
mod block;
mod call;
mod environment;
mod flow;
mod instruction;
mod log;
mod memory;
mod stack;
mod storage;
mod subroutine;
mod system;

pub use self::instruction::{
	CostFn, ExecuteFn, HaltFn, Instruction, InvalidOperation, VirtualOperation,
};
pub use self::system::stop;

use alloc::sync::Arc;
use evm_frame_core::{
	utils::u256_to_usize, ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, MessageFrame,
	Opcode, Operation,
};
use evm_frame_gasometer::GasCalculator;
use primitive_types::U256;

use crate::{Config, OperationRegistry};

/// Registers instructions for one code version, all priced by the same
/// calculator.
pub struct InstructionTable<'a> {
	registry: &'a mut OperationRegistry,
	calculator: Arc<dyn GasCalculator>,
	version: u32,
}

impl<'a> InstructionTable<'a> {
	pub fn new(
		registry: &'a mut OperationRegistry,
		calculator: Arc<dyn GasCalculator>,
		version: u32,
	) -> Self {
		Self {
			registry,
			calculator,
			version,
		}
	}

	/// A new entry priced by this table's calculator.
	pub fn instruction(
		&self,
		opcode: Opcode,
		name: &'static str,
		consumed: usize,
		produced: usize,
		cost: CostFn,
		execute: ExecuteFn,
	) -> Instruction {
		Instruction::new(
			opcode,
			name,
			consumed,
			produced,
			self.calculator.clone(),
			cost,
			execute,
		)
	}

	pub fn calculator(&self) -> Arc<dyn GasCalculator> {
		self.calculator.clone()
	}

	pub fn put(&mut self, instruction: Instruction) {
		self.put_operation(instruction.into_operation());
	}

	pub fn put_operation(&mut self, operation: Arc<dyn Operation>) {
		self.registry.put(operation, self.version);
	}
}

/// Register the instruction set enabled by `config`.
pub fn register(table: &mut InstructionTable<'_>, config: &Config) {
	system::register(table, config);
	arithmetic::register(table);
	bitwise::register(table, config);
	environment::register(table, config);
	block::register(table, config);
	memory::register(table);
	storage::register(table);
	flow::register(table);
	stack::register(table);
	log::register(table);
	call::register(table, config);
	if config.eip2315_subroutines {
		subroutine::register(table);
	}
}

/// Stack item used by cost formulas. Cost may run for tracing while another
/// halt is pending, so a missing item reads as zero instead of failing.
#[inline]
fn peek(frame: &MessageFrame, n: usize) -> U256 {
	frame.stack_item(n).unwrap_or_default()
}

/// Convert an operand validated by a halt condition.
#[inline]
fn as_usize(value: U256) -> Result<usize, ExitFatal> {
	u256_to_usize(value).ok_or(ExitFatal::UncheckedHalt(ExceptionalHaltReason::OutOfBounds))
}

/// Memory range operand as `(offset, len)`. An empty range never touches
/// memory, whatever its offset.
fn memory_range(offset: U256, len: U256) -> Result<(usize, usize), ExitFatal> {
	if len.is_zero() {
		return Ok((0, 0));
	}
	Ok((as_usize(offset)?, as_usize(len)?))
}

/// `OutOfBounds` when the range would take memory past its limit.
fn check_memory(frame: &MessageFrame, offset: U256, len: U256) -> Option<ExceptionalHaltReason> {
	if frame.memory().would_exceed_limit(offset, len) {
		Some(ExceptionalHaltReason::OutOfBounds)
	} else {
		None
	}
}

fn zero_tier(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().zero_tier_gas_cost())
}

fn base_tier(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().base_tier_gas_cost())
}

fn very_low_tier(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().very_low_tier_gas_cost())
}

fn low_tier(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().low_tier_gas_cost())
}

fn mid_tier(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().mid_tier_gas_cost())
}

fn high_tier(i: &Instruction, _: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	Ok(i.calculator().high_tier_gas_cost())
}

/// Pop two operands, push `f(a, b)`.
#[inline]
fn binary(frame: &mut MessageFrame, f: fn(U256, U256) -> U256) -> Result<(), ExitFatal> {
	let a = frame.pop_stack_item()?;
	let b = frame.pop_stack_item()?;
	frame.push_stack_item(f(a, b))?;
	Ok(())
}

/// Pop three operands, push `f(a, b, c)`.
#[inline]
fn ternary(frame: &mut MessageFrame, f: fn(U256, U256, U256) -> U256) -> Result<(), ExitFatal> {
	let a = frame.pop_stack_item()?;
	let b = frame.pop_stack_item()?;
	let c = frame.pop_stack_item()?;
	frame.push_stack_item(f(a, b, c))?;
	Ok(())
}

/// Pop one operand, push `f(a)`.
#[inline]
fn unary(frame: &mut MessageFrame, f: fn(U256) -> U256) -> Result<(), ExitFatal> {
	let a = frame.pop_stack_item()?;
	frame.push_stack_item(f(a))?;
	Ok(())
}

#[inline]
fn bool_to_u256(value: bool) -> U256 {
	if value {
		U256::one()
	} else {
		U256::zero()
	}
}
