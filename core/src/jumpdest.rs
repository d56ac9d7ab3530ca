use alloc::vec;
use alloc::vec::Vec;

use crate::Opcode;

const WORD_BITS: usize = 64;

/// Code positions that may be jumped to, found by one linear scan.
///
/// `JUMPDEST` and `BEGINSUB` bytes are recorded in separate bitmaps. Bytes
/// that are immediates of a `PUSHn` are skipped, so a `0x5b` inside push data
/// is never a destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JumpDestinations {
	jumpdests: Vec<u64>,
	beginsubs: Vec<u64>,
}

impl JumpDestinations {
	pub fn analyze(code: &[u8]) -> Self {
		let words = (code.len() + WORD_BITS - 1) / WORD_BITS;
		let mut jumpdests = vec![0u64; words];
		let mut beginsubs = vec![0u64; words];

		let mut position = 0;
		while position < code.len() {
			let opcode = Opcode(code[position]);
			match opcode {
				Opcode::JUMPDEST => set(&mut jumpdests, position),
				Opcode::BEGINSUB => set(&mut beginsubs, position),
				_ => (),
			}
			position += 1 + opcode.is_push().map_or(0, usize::from);
		}

		Self {
			jumpdests,
			beginsubs,
		}
	}

	pub fn is_jumpdest(&self, position: usize) -> bool {
		get(&self.jumpdests, position)
	}

	pub fn is_beginsub(&self, position: usize) -> bool {
		get(&self.beginsubs, position)
	}
}

#[inline]
fn set(bits: &mut [u64], position: usize) {
	bits[position / WORD_BITS] |= 1u64 << (position % WORD_BITS);
}

#[inline]
fn get(bits: &[u64], position: usize) -> bool {
	bits.get(position / WORD_BITS)
		.map_or(false, |word| word & (1u64 << (position % WORD_BITS)) != 0)
}
