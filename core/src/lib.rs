//! Message frame model of the evm-frame execution engine: code, stack,
//! memory and the frame state machine operations run against.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod code;
mod error;
mod frame;
mod gas;
mod host;
mod jumpdest;
mod memory;
mod opcode;
mod operation;
mod return_stack;
mod stack;
pub mod utils;

pub use crate::code::{Code, DEFAULT_VERSION};
pub use crate::error::{ExceptionalHaltReason, ExitError, ExitFatal, ExitResult};
pub use crate::frame::{
	BlockValues, CallKind, ChildOutcome, Log, MessageFrame, MessageFrameBuilder, MessageRequest,
	State,
};
pub use crate::gas::{Gas, GasOverflow};
pub use crate::host::{Host, MergeStrategy, Transfer};
pub use crate::jumpdest::JumpDestinations;
pub use crate::memory::{num_words, Memory, DEFAULT_MEMORY_LIMIT};
pub use crate::opcode::Opcode;
pub use crate::operation::Operation;
pub use crate::return_stack::{ReturnStack, DEFAULT_MAX_RETURN_STACK_SIZE};
pub use crate::stack::{Stack, DEFAULT_MAX_STACK_SIZE};
