use alloc::vec::Vec;

use crate::ExceptionalHaltReason;

/// Default return stack limit for subroutines.
pub const DEFAULT_MAX_RETURN_STACK_SIZE: usize = 1023;

/// Return stack used by `JUMPSUB` and `RETURNSUB`. Holds program counters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReturnStack {
	data: Vec<usize>,
	limit: usize,
}

impl ReturnStack {
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	#[inline]
	pub fn is_full(&self) -> bool {
		self.data.len() >= self.limit
	}

	pub fn push(&mut self, pc: usize) -> Result<(), ExceptionalHaltReason> {
		if self.is_full() {
			return Err(ExceptionalHaltReason::TooManyReturnStackItems);
		}
		self.data.push(pc);
		Ok(())
	}

	pub fn pop(&mut self) -> Result<usize, ExceptionalHaltReason> {
		self.data.pop().ok_or(ExceptionalHaltReason::InvalidRetsub)
	}
}
