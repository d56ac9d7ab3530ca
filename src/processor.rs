//! Nested message calls.
//!
//! Call operations only suspend their frame with a [`MessageRequest`]. The
//! processor keeps the frames of a transaction on an explicit call stack:
//! it starts a child for a suspended frame, runs the top frame, and hands a
//! finished child's outcome back to its parent.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use evm_frame_core::{
	ChildOutcome, Code, ExceptionalHaltReason, ExitError, ExitFatal, Gas, Host, Log,
	MergeStrategy, MessageFrame, MessageRequest, State, Transfer,
};
use primitive_types::H160;

use crate::{Config, Evm, OperationTracer};

/// Result of processing a top-level message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionOutcome {
	/// Final state of the top-level frame.
	pub state: State,
	/// Returned or reverted data.
	pub output: Vec<u8>,
	/// Gas left to the caller. Zero after an exceptional halt.
	pub remaining_gas: Gas,
	pub gas_refund: i64,
	/// Logs of the whole call tree. Empty unless the message succeeded.
	pub logs: Vec<Log>,
	pub halt_reason: Option<ExceptionalHaltReason>,
}

impl TransactionOutcome {
	pub fn is_success(&self) -> bool {
		self.state == State::CodeSuccess
	}
}

/// Runs a message and every nested call it makes.
pub struct MessageProcessor<'a> {
	evm: &'a Evm,
	config: &'a Config,
	code_cache: BTreeMap<H160, Arc<Code>>,
}

impl<'a> MessageProcessor<'a> {
	pub fn new(evm: &'a Evm, config: &'a Config) -> Self {
		Self {
			evm,
			config,
			code_cache: BTreeMap::new(),
		}
	}

	/// Process `frame` to completion. World-state changes of the message are
	/// kept in `host` only when it succeeds. On a fatal error every substate
	/// still open for the call tree is discarded.
	pub fn process(
		&mut self,
		frame: MessageFrame,
		host: &mut dyn Host,
		tracer: &mut dyn OperationTracer,
	) -> Result<TransactionOutcome, ExitFatal> {
		let mut call_stack = Vec::new();
		call_stack.push(frame);
		host.push_substate();

		let result = self.run(&mut call_stack, host, tracer);
		if let Err(fatal) = &result {
			log::debug!(
				target: "evm",
				"discarding {} open frames after {}",
				call_stack.len(),
				fatal,
			);
			for _ in 0..call_stack.len() {
				if host.pop_substate(MergeStrategy::Discard).is_err() {
					break;
				}
			}
		}
		result
	}

	/// Run the call stack until its last frame finishes. Every frame on
	/// `call_stack` owns one open substate of `host`.
	fn run(
		&mut self,
		call_stack: &mut Vec<MessageFrame>,
		host: &mut dyn Host,
		tracer: &mut dyn OperationTracer,
	) -> Result<TransactionOutcome, ExitFatal> {
		loop {
			let state = match call_stack.last() {
				Some(frame) => frame.state(),
				None => return Err(ExitFatal::UnhandledSuspension),
			};

			match state {
				State::CodeExecuting => {
					let frame = call_stack.last_mut().ok_or(ExitFatal::UnhandledSuspension)?;
					match self.evm.run_to_halt(frame, host, tracer) {
						Ok(()) | Err(ExitError::Exception(_)) => (),
						Err(ExitError::Fatal(fatal)) => return Err(fatal),
					}
				}
				State::CodeSuspended => {
					let parent = call_stack.last_mut().ok_or(ExitFatal::UnhandledSuspension)?;
					if let Some(child) = self.start_child(parent, host)? {
						log::debug!(
							target: "evm",
							"entering depth {} at {:?} with {} gas",
							child.depth(),
							child.address(),
							child.remaining_gas(),
						);
						call_stack.push(child);
					}
				}
				state => {
					let mut frame = call_stack.pop().ok_or(ExitFatal::UnhandledSuspension)?;
					let success = state == State::CodeSuccess;
					host.pop_substate(match state {
						State::CodeSuccess => MergeStrategy::Commit,
						State::Revert => MergeStrategy::Revert,
						_ => MergeStrategy::Discard,
					})?;

					let remaining_gas = match state {
						State::CodeSuccess | State::Revert => frame.remaining_gas(),
						_ => Gas::ZERO,
					};
					let (logs, gas_refund) = if success {
						(frame.take_logs(), frame.gas_refund())
					} else {
						(Vec::new(), 0)
					};
					let output = frame.take_output_data();

					let parent = match call_stack.last_mut() {
						Some(parent) => parent,
						None => {
							return Ok(TransactionOutcome {
								state,
								output,
								remaining_gas,
								gas_refund,
								logs,
								halt_reason: frame.exceptional_halt_reason(),
							})
						}
					};

					log::debug!(
						target: "evm",
						"leaving depth {} with {:?}, {} gas left",
						frame.depth(),
						state,
						remaining_gas,
					);
					let request = parent
						.take_pending_message()
						.ok_or(ExitFatal::UnhandledSuspension)?;
					parent.resume(
						request.output_offset,
						request.output_len,
						ChildOutcome {
							success,
							output,
							remaining_gas,
							gas_refund,
							logs,
						},
					)?;
				}
			}
		}
	}

	/// Child frame for the message `parent` is suspended on. A message that
	/// cannot start fails right away: `parent` is resumed with all forwarded
	/// gas and `None` is returned.
	fn start_child(
		&mut self,
		parent: &mut MessageFrame,
		host: &mut dyn Host,
	) -> Result<Option<MessageFrame>, ExitFatal> {
		let request = parent
			.pending_message()
			.ok_or(ExitFatal::UnhandledSuspension)?;

		if parent.depth() >= self.config.call_stack_limit {
			log::debug!(target: "evm", "call depth limit reached at depth {}", parent.depth());
			return Self::refuse(parent).map(|_| None);
		}
		if host.balance(request.caller) < request.transfer_value {
			log::debug!(target: "evm", "{:?} cannot afford {}", request.caller, request.transfer_value);
			return Self::refuse(parent).map(|_| None);
		}

		host.push_substate();
		let transfer = Transfer {
			source: request.caller,
			target: request.address,
			value: request.transfer_value,
		};
		if !host.transfer(&transfer) {
			host.pop_substate(MergeStrategy::Discard)?;
			return Self::refuse(parent).map(|_| None);
		}

		let code = self.code(&*host, request.code_address);
		Ok(Some(self.child_frame(parent, request, code)))
	}

	fn refuse(parent: &mut MessageFrame) -> Result<(), ExitFatal> {
		let request = parent
			.take_pending_message()
			.ok_or(ExitFatal::UnhandledSuspension)?;
		parent.resume(
			request.output_offset,
			request.output_len,
			ChildOutcome::not_started(request.gas),
		)
	}

	fn child_frame(
		&self,
		parent: &MessageFrame,
		request: &MessageRequest,
		code: Arc<Code>,
	) -> MessageFrame {
		MessageFrame::builder()
			.shared_code(code)
			.initial_gas(request.gas)
			.depth(parent.depth() + 1)
			.address(request.address)
			.caller(request.caller)
			.origin(parent.origin())
			.value(request.apparent_value)
			.input(request.input.clone())
			.gas_price(parent.gas_price())
			.is_static(request.is_static)
			.block_values(parent.block_values().clone())
			.max_stack_size(self.config.max_stack_size)
			.max_return_stack_size(self.config.max_return_stack_size)
			.memory_limit(self.config.memory_limit)
			.build()
	}

	/// Code of `address`, shared between every frame running it.
	fn code(&mut self, host: &dyn Host, address: H160) -> Arc<Code> {
		self.code_cache
			.entry(address)
			.or_insert_with(|| Arc::new(Code::new(host.code(address), host.code_version(address))))
			.clone()
	}
}
