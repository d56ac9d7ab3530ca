use core::fmt;

use crate::{ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Host, MessageFrame, Opcode};

/// One instruction of the instruction set.
///
/// Operations are stateless descriptors shared between every frame that runs
/// under the same registry. The interpreter asks an operation for its shape
/// (stack effect, size) and cost before letting it touch the frame, so by the
/// time `execute` runs the stack holds enough items, has room for the
/// results and the gas has been paid.
pub trait Operation: fmt::Debug + Send + Sync {
	/// Opcode byte this operation is registered under.
	fn opcode(&self) -> Opcode;
	/// Mnemonic.
	fn name(&self) -> &'static str;
	/// Number of stack items popped.
	fn stack_items_consumed(&self) -> usize;
	/// Number of stack items pushed.
	fn stack_items_produced(&self) -> usize;

	/// Net change of the stack height.
	fn stack_size_change(&self) -> isize {
		self.stack_items_produced() as isize - self.stack_items_consumed() as isize
	}

	/// Encoded length, including immediates.
	fn op_size(&self) -> usize {
		1
	}

	/// Whether `execute` positions the program counter itself.
	fn updates_program_counter(&self) -> bool {
		false
	}

	/// Whether this is a stand-in that does not exist in the code (the
	/// implicit `STOP` past the end of the code).
	fn is_virtual(&self) -> bool {
		false
	}

	/// Gas charged for executing the operation against `frame`.
	///
	/// May read the stack, but only once the stack is known to hold
	/// `stack_items_consumed` items.
	fn cost(&self, frame: &MessageFrame, host: &dyn Host) -> Result<Gas, GasOverflow>;

	/// Halt condition beyond the generic stack and gas checks.
	fn exceptional_halt_condition(
		&self,
		_frame: &MessageFrame,
		_host: &dyn Host,
	) -> Option<ExceptionalHaltReason> {
		None
	}

	/// Apply the operation to the frame.
	fn execute(&self, frame: &mut MessageFrame, host: &mut dyn Host) -> Result<(), ExitFatal>;
}
