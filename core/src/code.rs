use alloc::vec::Vec;

use crate::{JumpDestinations, Opcode};

/// Default account/code version.
pub const DEFAULT_VERSION: u32 = 0;

/// Immutable contract code together with its jump destination analysis.
///
/// Created once per invocation from bytes supplied by the state layer and
/// shared read-only (behind an `Arc`) between all frames running it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Code {
	bytes: Vec<u8>,
	version: u32,
	jump_destinations: JumpDestinations,
}

impl Code {
	pub fn new(bytes: Vec<u8>, version: u32) -> Self {
		let jump_destinations = JumpDestinations::analyze(&bytes);
		Self {
			bytes,
			version,
			jump_destinations,
		}
	}

	/// Code with the default version.
	pub fn from_bytes(bytes: Vec<u8>) -> Self {
		Self::new(bytes, DEFAULT_VERSION)
	}

	pub fn empty() -> Self {
		Self::from_bytes(Vec::new())
	}

	#[inline]
	pub fn size(&self) -> usize {
		self.bytes.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	#[inline]
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	#[inline]
	pub fn version(&self) -> u32 {
		self.version
	}

	/// Byte at `offset`, `None` past the end of the code.
	#[inline]
	pub fn get(&self, offset: usize) -> Option<u8> {
		self.bytes.get(offset).copied()
	}

	#[inline]
	pub fn opcode_at(&self, offset: usize) -> Option<Opcode> {
		self.get(offset).map(Opcode)
	}

	pub fn is_valid_jump_destination(&self, position: usize) -> bool {
		self.jump_destinations.is_jumpdest(position)
	}

	pub fn is_valid_begin_sub(&self, position: usize) -> bool {
		self.jump_destinations.is_beginsub(position)
	}

	/// Immediate data of a `PUSHn` at `position`, zero padded when the code
	/// ends early.
	pub fn push_data(&self, position: usize, len: usize) -> [u8; 32] {
		let mut val = [0u8; 32];
		let start = position + 1;
		if start < self.bytes.len() {
			let end = core::cmp::min(start + len, self.bytes.len());
			let slice = &self.bytes[start..end];
			val[(32 - len)..(32 - len + slice.len())].copy_from_slice(slice);
		}
		val
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bytes_past_the_end_are_undefined() {
		let code = Code::from_bytes(alloc::vec![0x00]);
		assert_eq!(code.size(), 1);
		assert_eq!(code.get(0), Some(0x00));
		assert_eq!(code.get(1), None);
	}

	#[test]
	fn truncated_push_data_is_zero_padded() {
		// PUSH4 0x01 0x02 <end>
		let code = Code::from_bytes(alloc::vec![0x63, 0x01, 0x02]);
		let data = code.push_data(0, 4);
		assert_eq!(&data[28..], &[0x01, 0x02, 0x00, 0x00]);
		assert!(data[..28].iter().all(|b| *b == 0));
	}
}
