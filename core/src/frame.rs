use alloc::sync::Arc;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

use crate::memory::DEFAULT_MEMORY_LIMIT;
use crate::return_stack::DEFAULT_MAX_RETURN_STACK_SIZE;
use crate::stack::DEFAULT_MAX_STACK_SIZE;
use crate::{
	Code, ExceptionalHaltReason, ExitFatal, Gas, GasOverflow, Memory, Operation, ReturnStack,
	Stack,
};

/// Lifecycle of a message frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
	/// Instructions are being dispatched. Initial state.
	CodeExecuting,
	/// Waiting for a child call to finish.
	CodeSuspended,
	/// Stopped or returned normally.
	CodeSuccess,
	/// Forcibly ended by the interpreter.
	ExceptionalHalt,
	/// Explicitly reverted by the code.
	Revert,
	/// Aborted on an internal failure.
	CompletedFailed,
}

impl State {
	/// Whether the frame can no longer run.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, State::CodeExecuting | State::CodeSuspended)
	}
}

/// Block context available to the code.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockValues {
	pub coinbase: H160,
	pub timestamp: U256,
	pub number: U256,
	pub difficulty: U256,
	pub gas_limit: U256,
	pub base_fee: U256,
	pub chain_id: U256,
}

/// A log entry produced by `LOGn`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
	pub address: H160,
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// Kind of a nested message call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallKind {
	Call,
	DelegateCall,
	StaticCall,
}

/// Child call requested by a suspending operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageRequest {
	pub kind: CallKind,
	/// Gas handed to the child, stipend included.
	pub gas: Gas,
	/// Account whose storage and balance the child runs against.
	pub address: H160,
	/// Account whose code the child runs.
	pub code_address: H160,
	pub caller: H160,
	/// Value actually moved from `caller` to `address`.
	pub transfer_value: U256,
	/// Value reported by `CALLVALUE` in the child.
	pub apparent_value: U256,
	pub input: Vec<u8>,
	pub is_static: bool,
	/// Memory window the child's output is copied into.
	pub output_offset: usize,
	pub output_len: usize,
}

/// What a finished child call hands back to its parent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChildOutcome {
	pub success: bool,
	pub output: Vec<u8>,
	pub remaining_gas: Gas,
	pub gas_refund: i64,
	pub logs: Vec<Log>,
}

impl ChildOutcome {
	/// Outcome of a child that never started; all forwarded gas comes back.
	pub fn not_started(gas: Gas) -> Self {
		Self {
			success: false,
			output: Vec::new(),
			remaining_gas: gas,
			gas_refund: 0,
			logs: Vec::new(),
		}
	}
}

/// Execution context of a single message call.
#[derive(Debug)]
pub struct MessageFrame {
	code: Arc<Code>,
	stack: Stack,
	return_stack: ReturnStack,
	memory: Memory,
	pc: usize,
	initial_gas: Gas,
	remaining_gas: Gas,
	depth: usize,
	state: State,
	current_operation: Option<Arc<dyn Operation>>,
	current_gas_cost: Option<Gas>,
	halt_reason: Option<ExceptionalHaltReason>,
	output_data: Vec<u8>,
	return_data: Arc<Vec<u8>>,
	logs: Vec<Log>,
	gas_refund: i64,
	pending_message: Option<MessageRequest>,

	address: H160,
	caller: H160,
	origin: H160,
	value: U256,
	input: Arc<Vec<u8>>,
	gas_price: U256,
	is_static: bool,
	block_values: BlockValues,
}

impl MessageFrame {
	pub fn builder() -> MessageFrameBuilder {
		MessageFrameBuilder::default()
	}

	pub fn code(&self) -> &Arc<Code> {
		&self.code
	}

	/// Account/code version used to resolve opcodes.
	pub fn contract_account_version(&self) -> u32 {
		self.code.version()
	}

	pub fn stack(&self) -> &Stack {
		&self.stack
	}

	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}

	pub fn stack_size(&self) -> usize {
		self.stack.len()
	}

	pub fn max_stack_size(&self) -> usize {
		self.stack.limit()
	}

	/// Stack item at `offset` from the top.
	pub fn stack_item(&self, offset: usize) -> Result<U256, ExceptionalHaltReason> {
		self.stack.peek(offset)
	}

	pub fn push_stack_item(&mut self, value: U256) -> Result<(), ExceptionalHaltReason> {
		self.stack.push(value)
	}

	pub fn pop_stack_item(&mut self) -> Result<U256, ExceptionalHaltReason> {
		self.stack.pop()
	}

	pub fn return_stack(&self) -> &ReturnStack {
		&self.return_stack
	}

	pub fn return_stack_mut(&mut self) -> &mut ReturnStack {
		&mut self.return_stack
	}

	pub fn memory(&self) -> &Memory {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}

	pub fn pc(&self) -> usize {
		self.pc
	}

	pub fn set_pc(&mut self, pc: usize) {
		self.pc = pc;
	}

	pub fn initial_gas(&self) -> Gas {
		self.initial_gas
	}

	pub fn remaining_gas(&self) -> Gas {
		self.remaining_gas
	}

	/// Deduct `cost`. Never goes below zero: an unaffordable cost is an
	/// error and leaves the remaining gas unchanged.
	pub fn decrement_remaining_gas(&mut self, cost: Gas) -> Result<(), GasOverflow> {
		self.remaining_gas = self.remaining_gas.checked_sub(cost)?;
		Ok(())
	}

	pub fn increment_remaining_gas(&mut self, amount: Gas) -> Result<(), GasOverflow> {
		self.remaining_gas = self.remaining_gas.checked_add(amount)?;
		Ok(())
	}

	/// Message/call depth, zero for the top-level call.
	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn state(&self) -> State {
		self.state
	}

	/// Move to `state`. `EXCEPTIONAL_HALT` is only entered through
	/// [`MessageFrame::set_exceptional_halt`] and never left.
	pub fn set_state(&mut self, state: State) -> Result<(), ExitFatal> {
		if self.state == State::ExceptionalHalt || state == State::ExceptionalHalt {
			return Err(ExitFatal::InvalidStateTransition);
		}
		self.state = state;
		Ok(())
	}

	pub fn current_operation(&self) -> Option<&Arc<dyn Operation>> {
		self.current_operation.as_ref()
	}

	pub fn set_current_operation(&mut self, operation: Arc<dyn Operation>) {
		self.current_operation = Some(operation);
	}

	/// Gas charged for the current operation, once it has been computed.
	pub fn current_gas_cost(&self) -> Option<Gas> {
		self.current_gas_cost
	}

	pub fn set_current_gas_cost(&mut self, cost: Option<Gas>) {
		self.current_gas_cost = cost;
	}

	pub fn exceptional_halt_reason(&self) -> Option<ExceptionalHaltReason> {
		self.halt_reason
	}

	/// Move to `EXCEPTIONAL_HALT`. The first reason recorded is kept and
	/// output data is cleared. Remaining gas is left as it was before the
	/// halting step; the caller of the frame treats it as consumed.
	pub fn set_exceptional_halt(&mut self, reason: ExceptionalHaltReason) {
		if self.halt_reason.is_none() {
			self.halt_reason = Some(reason);
		}
		self.state = State::ExceptionalHalt;
		self.output_data.clear();
	}

	pub fn output_data(&self) -> &[u8] {
		&self.output_data
	}

	pub fn set_output_data(&mut self, output: Vec<u8>) {
		self.output_data = output;
	}

	pub fn take_output_data(&mut self) -> Vec<u8> {
		core::mem::take(&mut self.output_data)
	}

	/// Output of the most recent child call.
	pub fn return_data(&self) -> &[u8] {
		&self.return_data
	}

	pub fn shared_return_data(&self) -> Arc<Vec<u8>> {
		self.return_data.clone()
	}

	pub fn set_return_data(&mut self, data: Vec<u8>) {
		self.return_data = Arc::new(data);
	}

	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	pub fn add_log(&mut self, log: Log) {
		self.logs.push(log);
	}

	pub fn take_logs(&mut self) -> Vec<Log> {
		core::mem::take(&mut self.logs)
	}

	pub fn gas_refund(&self) -> i64 {
		self.gas_refund
	}

	pub fn increment_gas_refund(&mut self, amount: i64) {
		self.gas_refund = self.gas_refund.saturating_add(amount);
	}

	pub fn address(&self) -> H160 {
		self.address
	}

	pub fn caller(&self) -> H160 {
		self.caller
	}

	pub fn origin(&self) -> H160 {
		self.origin
	}

	/// Apparent value of the call.
	pub fn value(&self) -> U256 {
		self.value
	}

	pub fn input(&self) -> &[u8] {
		&self.input
	}

	pub fn shared_input(&self) -> Arc<Vec<u8>> {
		self.input.clone()
	}

	pub fn gas_price(&self) -> U256 {
		self.gas_price
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	pub fn block_values(&self) -> &BlockValues {
		&self.block_values
	}

	/// Suspend the frame until the child described by `request` finishes.
	pub fn suspend(&mut self, request: MessageRequest) {
		self.pending_message = Some(request);
		self.state = State::CodeSuspended;
	}

	pub fn pending_message(&self) -> Option<&MessageRequest> {
		self.pending_message.as_ref()
	}

	pub fn take_pending_message(&mut self) -> Option<MessageRequest> {
		self.pending_message.take()
	}

	/// Fold a finished child call back into this frame and re-enter
	/// `CODE_EXECUTING` right after the suspending instruction.
	pub fn resume(
		&mut self,
		output_offset: usize,
		output_len: usize,
		outcome: ChildOutcome,
	) -> Result<(), ExitFatal> {
		if self.state != State::CodeSuspended {
			return Err(ExitFatal::UnhandledSuspension);
		}

		self.state = State::CodeExecuting;
		self.increment_remaining_gas(outcome.remaining_gas)
			.map_err(|_| ExitFatal::GasAccountingOverflow)?;

		let copied = core::cmp::min(output_len, outcome.output.len());
		if copied > 0 {
			self.memory
				.set(output_offset, &outcome.output[..copied], None);
		}

		self.stack.push(if outcome.success {
			U256::one()
		} else {
			U256::zero()
		})?;

		if outcome.success {
			self.logs.extend(outcome.logs);
			self.increment_gas_refund(outcome.gas_refund);
		}
		self.return_data = Arc::new(outcome.output);
		self.pc += 1;

		Ok(())
	}
}

/// Builder for [`MessageFrame`].
#[derive(Clone, Debug)]
pub struct MessageFrameBuilder {
	code: Option<Arc<Code>>,
	initial_gas: Gas,
	depth: usize,
	address: H160,
	caller: H160,
	origin: H160,
	value: U256,
	input: Vec<u8>,
	gas_price: U256,
	is_static: bool,
	block_values: BlockValues,
	max_stack_size: usize,
	max_return_stack_size: usize,
	memory_limit: usize,
}

impl Default for MessageFrameBuilder {
	fn default() -> Self {
		Self {
			code: None,
			initial_gas: Gas::ZERO,
			depth: 0,
			address: H160::default(),
			caller: H160::default(),
			origin: H160::default(),
			value: U256::zero(),
			input: Vec::new(),
			gas_price: U256::zero(),
			is_static: false,
			block_values: BlockValues::default(),
			max_stack_size: DEFAULT_MAX_STACK_SIZE,
			max_return_stack_size: DEFAULT_MAX_RETURN_STACK_SIZE,
			memory_limit: DEFAULT_MEMORY_LIMIT,
		}
	}
}

impl MessageFrameBuilder {
	pub fn code(mut self, code: Code) -> Self {
		self.code = Some(Arc::new(code));
		self
	}

	pub fn shared_code(mut self, code: Arc<Code>) -> Self {
		self.code = Some(code);
		self
	}

	pub fn initial_gas(mut self, gas: Gas) -> Self {
		self.initial_gas = gas;
		self
	}

	pub fn depth(mut self, depth: usize) -> Self {
		self.depth = depth;
		self
	}

	pub fn address(mut self, address: H160) -> Self {
		self.address = address;
		self
	}

	pub fn caller(mut self, caller: H160) -> Self {
		self.caller = caller;
		self
	}

	pub fn origin(mut self, origin: H160) -> Self {
		self.origin = origin;
		self
	}

	pub fn value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}

	pub fn input(mut self, input: Vec<u8>) -> Self {
		self.input = input;
		self
	}

	pub fn gas_price(mut self, gas_price: U256) -> Self {
		self.gas_price = gas_price;
		self
	}

	pub fn is_static(mut self, is_static: bool) -> Self {
		self.is_static = is_static;
		self
	}

	pub fn block_values(mut self, block_values: BlockValues) -> Self {
		self.block_values = block_values;
		self
	}

	pub fn max_stack_size(mut self, size: usize) -> Self {
		self.max_stack_size = size;
		self
	}

	pub fn max_return_stack_size(mut self, size: usize) -> Self {
		self.max_return_stack_size = size;
		self
	}

	pub fn memory_limit(mut self, limit: usize) -> Self {
		self.memory_limit = limit;
		self
	}

	pub fn build(self) -> MessageFrame {
		MessageFrame {
			code: self.code.unwrap_or_else(|| Arc::new(Code::empty())),
			stack: Stack::new(self.max_stack_size),
			return_stack: ReturnStack::new(self.max_return_stack_size),
			memory: Memory::new(self.memory_limit),
			pc: 0,
			initial_gas: self.initial_gas,
			remaining_gas: self.initial_gas,
			depth: self.depth,
			state: State::CodeExecuting,
			current_operation: None,
			current_gas_cost: None,
			halt_reason: None,
			output_data: Vec::new(),
			return_data: Arc::new(Vec::new()),
			logs: Vec::new(),
			gas_refund: 0,
			pending_message: None,
			address: self.address,
			caller: self.caller,
			origin: self.origin,
			value: self.value,
			input: Arc::new(self.input),
			gas_price: self.gas_price,
			is_static: self.is_static,
			block_values: self.block_values,
		}
	}
}
