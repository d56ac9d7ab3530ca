//! Message-frame based Ethereum Virtual Machine.
//!
//! An [`Evm`] runs a [`MessageFrame`] operation by operation until it leaves
//! `CODE_EXECUTING`. Nested calls suspend the frame; the
//! [`MessageProcessor`] runs the child frames on an explicit call stack.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use evm_frame_core::*;
pub use evm_frame_gasometer as gasometer;

#[cfg(feature = "tracing")]
macro_rules! event {
	($x:expr) => {{
		#[allow(unused_imports)]
		use crate::tracing::Event;
		crate::tracing::with(|listener| listener.event($x));
	}};
}

#[cfg(not(feature = "tracing"))]
macro_rules! event {
	($x:expr) => {};
}

pub mod backend;
mod config;
mod evm;
pub mod operations;
mod processor;
mod registry;
pub mod tracing;

pub use crate::config::{Config, GasSchedule, DEFAULT_CALL_STACK_LIMIT};
pub use crate::evm::{Evm, Step};
pub use crate::processor::{MessageProcessor, TransactionOutcome};
pub use crate::registry::OperationRegistry;
pub use crate::tracing::{NoTracer, OperationTracer, StructLog, StructLogTracer};
