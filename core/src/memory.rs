use alloc::vec::Vec;
use core::cmp::min;
use primitive_types::{H256, U256};

use crate::utils::USIZE_MAX;

/// Default memory limit in bytes.
pub const DEFAULT_MEMORY_LIMIT: usize = 32 * 1024 * 1024;

/// Word-addressed, zero-initialised memory of a message frame. It uses
/// Rust's `Vec` for internal representation and always covers a whole
/// number of 32-byte words.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	limit: usize,
}

/// Number of 32-byte words needed to cover `len` bytes.
#[inline]
pub fn num_words(len: usize) -> usize {
	len / 32 + usize::from(len % 32 != 0)
}

impl Memory {
	/// Create a new memory with the given limit.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Memory limit.
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Length in bytes of the active memory.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Number of active 32-byte words.
	pub fn active_words(&self) -> usize {
		self.data.len() / 32
	}

	/// Return the full memory.
	pub fn data(&self) -> &Vec<u8> {
		&self.data
	}

	/// Whether touching `offset..offset + len` would go past the limit. A
	/// zero length never touches memory.
	pub fn would_exceed_limit(&self, offset: U256, len: U256) -> bool {
		if len.is_zero() {
			return false;
		}
		match offset.checked_add(len) {
			Some(end) => end > USIZE_MAX || end.as_usize() > self.limit,
			None => true,
		}
	}

	/// Grow the active memory so it covers `offset..offset + len`, rounded
	/// up to whole words. A zero length does nothing.
	pub fn expand(&mut self, offset: usize, len: usize) {
		if len == 0 {
			return;
		}
		let end = num_words(offset + len) * 32;
		if end > self.data.len() {
			self.data.resize(end, 0);
		}
	}

	/// Get memory region at given offset, expanding memory to cover it.
	pub fn get(&mut self, offset: usize, size: usize) -> Vec<u8> {
		self.expand(offset, size);
		if size == 0 {
			return Vec::new();
		}
		self.data[offset..offset + size].to_vec()
	}

	/// Get the 32-byte word at `offset`, expanding memory to cover it.
	pub fn get_word(&mut self, offset: usize) -> H256 {
		self.expand(offset, 32);
		H256::from_slice(&self.data[offset..offset + 32])
	}

	/// Set memory region at given offset. When `target_size` is longer than
	/// `value` the rest is zero filled.
	pub fn set(&mut self, offset: usize, value: &[u8], target_size: Option<usize>) {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return;
		}
		self.expand(offset, target_size);

		let copied = min(target_size, value.len());
		self.data[offset..offset + copied].copy_from_slice(&value[..copied]);
		for byte in &mut self.data[offset + copied..offset + target_size] {
			*byte = 0;
		}
	}

	/// Copy `len` bytes of `data` starting at `data_offset` into memory at
	/// `memory_offset`. Reads past the end of `data` produce zeros.
	///
	/// Offsets are expected to have been validated against the limit.
	pub fn copy_large(&mut self, memory_offset: usize, data_offset: U256, len: usize, data: &[u8]) {
		if len == 0 {
			return;
		}

		let source = if data_offset > USIZE_MAX {
			&[][..]
		} else {
			let data_offset = data_offset.as_usize();
			if data_offset >= data.len() {
				&[][..]
			} else {
				let end = min(data_offset.saturating_add(len), data.len());
				&data[data_offset..end]
			}
		};

		self.set(memory_offset, source, Some(len));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expansion_rounds_to_words() {
		let mut memory = Memory::new(1024);
		memory.expand(0, 1);
		assert_eq!(memory.len(), 32);
		memory.expand(31, 2);
		assert_eq!(memory.active_words(), 2);
		memory.expand(1000, 0);
		assert_eq!(memory.active_words(), 2);
	}

	#[test]
	fn copy_large_pads_with_zeros() {
		let mut memory = Memory::new(1024);
		memory.copy_large(3, U256::from(2), 4, &[1u8, 2, 3, 4, 5]);
		assert_eq!(&memory.data()[..8], &[0u8, 0, 0, 3, 4, 5, 0, 0]);
		assert_eq!(memory.len(), 32);
	}

	#[test]
	fn limit_is_checked_on_the_end_of_the_range() {
		let memory = Memory::new(64);
		assert!(!memory.would_exceed_limit(U256::from(32), U256::from(32)));
		assert!(memory.would_exceed_limit(U256::from(33), U256::from(32)));
		assert!(!memory.would_exceed_limit(U256::MAX, U256::zero()));
		assert!(memory.would_exceed_limit(U256::MAX, U256::one()));
	}

	#[test]
	fn set_zero_fills_target() {
		let mut memory = Memory::new(1024);
		memory.set(0, &[0xff; 4], None);
		memory.set(0, &[0x01], Some(4));
		assert_eq!(&memory.data()[..4], &[0x01, 0, 0, 0]);
	}
}
