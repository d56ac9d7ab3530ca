//! Observers of the interpreter loop.
//!
//! An [`OperationTracer`] is handed to `Evm::run_to_halt` and called around
//! every step with read-only access to the frame. With the `tracing` feature
//! an [`EventListener`] can additionally be installed for a scope with
//! [`using`], in the manner of an `environmental` global.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use evm_frame_core::{ExceptionalHaltReason, Gas, MessageFrame, Operation};
use primitive_types::U256;

use crate::Step;

/// Synchronous per-instruction hook. Never alters execution.
#[auto_impl::auto_impl(&mut, Box)]
pub trait OperationTracer {
	/// Called once the halt checks ran, before gas is charged. `gas_cost` is
	/// `None` when the cost was not computed (stack underflow) or overflowed.
	fn trace_execution(
		&mut self,
		frame: &MessageFrame,
		operation: &dyn Operation,
		gas_cost: Option<Gas>,
	);

	/// Called after the step with its outcome.
	fn trace_post_execution(&mut self, _frame: &MessageFrame, _step: &Step) {}
}

/// Tracer that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTracer;

impl OperationTracer for NoTracer {
	fn trace_execution(&mut self, _: &MessageFrame, _: &dyn Operation, _: Option<Gas>) {}
}

/// One executed (or halting) step.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructLog {
	pub pc: usize,
	pub op: String,
	pub depth: usize,
	/// Remaining gas before the step.
	pub gas: Gas,
	pub gas_cost: Option<Gas>,
	/// Operand stack, bottom first.
	pub stack: Vec<U256>,
	pub memory_size: usize,
	pub halt_reason: Option<ExceptionalHaltReason>,
}

/// Collects a [`StructLog`] per step.
#[derive(Clone, Debug, Default)]
pub struct StructLogTracer {
	logs: Vec<StructLog>,
}

impl StructLogTracer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn logs(&self) -> &[StructLog] {
		&self.logs
	}

	pub fn into_logs(self) -> Vec<StructLog> {
		self.logs
	}
}

impl OperationTracer for StructLogTracer {
	fn trace_execution(
		&mut self,
		frame: &MessageFrame,
		operation: &dyn Operation,
		gas_cost: Option<Gas>,
	) {
		self.logs.push(StructLog {
			pc: frame.pc(),
			op: operation.name().to_string(),
			depth: frame.depth(),
			gas: frame.remaining_gas(),
			gas_cost,
			stack: frame.stack().data().clone(),
			memory_size: frame.memory().len(),
			halt_reason: None,
		});
	}

	fn trace_post_execution(&mut self, _frame: &MessageFrame, step: &Step) {
		if let (Step::Halt(reason), Some(log)) = (step, self.logs.last_mut()) {
			log.halt_reason = Some(*reason);
		}
	}
}

#[cfg(feature = "tracing")]
pub use self::events::*;

#[cfg(feature = "tracing")]
mod events {
	use evm_frame_core::{ExceptionalHaltReason, Gas, Memory, Opcode, Stack};

	environmental::environmental!(listener: dyn EventListener + 'static);

	pub trait EventListener {
		fn event(&mut self, event: Event);
	}

	#[derive(Debug, Copy, Clone)]
	pub enum Event<'a> {
		Step {
			depth: usize,
			pc: usize,
			opcode: Opcode,
			gas_cost: Option<Gas>,
			remaining_gas: Gas,
			stack: &'a Stack,
			memory: &'a Memory,
		},
		Halt {
			depth: usize,
			pc: usize,
			reason: ExceptionalHaltReason,
		},
	}

	pub(crate) fn with<F: FnOnce(&mut (dyn EventListener + 'static))>(f: F) {
		listener::with(f);
	}

	/// Run closure with provided listener.
	pub fn using<R, F: FnOnce() -> R>(new: &mut (dyn EventListener + 'static), f: F) -> R {
		listener::using(new, f)
	}
}
