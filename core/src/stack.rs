use alloc::vec::Vec;
use primitive_types::{H256, U256};

use crate::ExceptionalHaltReason;

/// Default operand stack limit.
pub const DEFAULT_MAX_STACK_SIZE: usize = 1024;

/// Operand stack of a message frame.
#[derive(Clone, Debug)]
pub struct Stack {
	data: Vec<U256>,
	limit: usize,
}

impl Stack {
	/// Create a new stack with given limit.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	#[inline]
	pub fn limit(&self) -> usize {
		self.limit
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Stack data, bottom first.
	#[inline]
	pub fn data(&self) -> &Vec<U256> {
		&self.data
	}

	/// Pop a value from the stack. If the stack is already empty, returns
	/// `InsufficientStackItems`.
	#[inline]
	pub fn pop(&mut self) -> Result<U256, ExceptionalHaltReason> {
		self.data
			.pop()
			.ok_or(ExceptionalHaltReason::InsufficientStackItems)
	}

	#[inline]
	pub fn pop_h256(&mut self) -> Result<H256, ExceptionalHaltReason> {
		self.pop().map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	/// Push a new value into the stack. If it would exceed the stack limit,
	/// returns `TooManyStackItems` and leaves the stack unchanged.
	#[inline]
	pub fn push(&mut self, value: U256) -> Result<(), ExceptionalHaltReason> {
		if self.data.len() + 1 > self.limit {
			return Err(ExceptionalHaltReason::TooManyStackItems);
		}
		self.data.push(value);
		Ok(())
	}

	#[inline]
	pub fn push_h256(&mut self, value: H256) -> Result<(), ExceptionalHaltReason> {
		self.push(U256::from_big_endian(&value[..]))
	}

	/// Peek a value at given index for the stack, where the top of
	/// the stack is at index `0`.
	#[inline]
	pub fn peek(&self, no_from_top: usize) -> Result<U256, ExceptionalHaltReason> {
		if self.data.len() > no_from_top {
			Ok(self.data[self.data.len() - no_from_top - 1])
		} else {
			Err(ExceptionalHaltReason::InsufficientStackItems)
		}
	}

	/// Set a value at given index for the stack, where the top of the
	/// stack is at index `0`.
	#[inline]
	pub fn set(&mut self, no_from_top: usize, val: U256) -> Result<(), ExceptionalHaltReason> {
		if self.data.len() > no_from_top {
			let len = self.data.len();
			self.data[len - no_from_top - 1] = val;
			Ok(())
		} else {
			Err(ExceptionalHaltReason::InsufficientStackItems)
		}
	}

	/// Push a copy of the `n`th item (1-based from the top).
	pub fn dup(&mut self, n: usize) -> Result<(), ExceptionalHaltReason> {
		let value = self.peek(n - 1)?;
		self.push(value)
	}

	/// Exchange the top item with the `n + 1`th item.
	pub fn swap(&mut self, n: usize) -> Result<(), ExceptionalHaltReason> {
		let top = self.peek(0)?;
		let other = self.peek(n)?;
		self.set(0, other)?;
		self.set(n, top)
	}
}
