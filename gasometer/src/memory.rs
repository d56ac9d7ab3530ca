use evm_frame_core::{Gas, GasOverflow};
use primitive_types::U256;

use crate::consts;

/// Total cost of `words` active memory words: `3 * w + w * w / 512`.
pub fn memory_gas(words: u64) -> Result<Gas, GasOverflow> {
	let linear = Gas::new(consts::G_MEMORY).checked_mul(Gas::new(words))?;
	let quadratic = Gas::new(words).checked_mul(Gas::new(words))?.as_u64() / consts::G_QUADCOEFFDIV;
	linear.checked_add(Gas::new(quadratic))
}

/// Number of words covering `offset..offset + len`, or `None` when nothing
/// is touched.
pub fn memory_words(offset: U256, len: U256) -> Result<Option<u64>, GasOverflow> {
	if len.is_zero() {
		return Ok(None);
	}

	let end = offset.checked_add(len).ok_or(GasOverflow)?;
	let words = end / 32 + if (end % 32).is_zero() { 0 } else { 1 };
	Gas::of(words).map(|words| Some(words.as_u64()))
}

/// Cost of growing memory from `active_words` so that it covers
/// `offset..offset + len`.
pub fn memory_expansion_cost(active_words: usize, offset: U256, len: U256) -> Result<Gas, GasOverflow> {
	let new_words = match memory_words(offset, len)? {
		Some(words) => words,
		None => return Ok(Gas::ZERO),
	};
	let active_words = active_words as u64;
	if new_words <= active_words {
		return Ok(Gas::ZERO);
	}

	memory_gas(new_words)?.checked_sub(memory_gas(active_words)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn charges_only_the_growth() {
		assert_eq!(memory_gas(1), Ok(Gas::new(3)));
		assert_eq!(memory_gas(1024), Ok(Gas::new(3 * 1024 + 2048)));
		assert_eq!(
			memory_expansion_cost(0, U256::zero(), U256::from(32)),
			Ok(Gas::new(3))
		);
		assert_eq!(
			memory_expansion_cost(1, U256::from(31), U256::from(1)),
			Ok(Gas::ZERO)
		);
		assert_eq!(
			memory_expansion_cost(1, U256::from(32), U256::from(1)),
			Ok(Gas::new(3))
		);
	}

	#[test]
	fn zero_length_is_free() {
		assert_eq!(
			memory_expansion_cost(0, U256::MAX, U256::zero()),
			Ok(Gas::ZERO)
		);
	}

	#[test]
	fn huge_ranges_overflow() {
		assert_eq!(
			memory_expansion_cost(0, U256::MAX, U256::one()),
			Err(GasOverflow)
		);
		assert_eq!(
			memory_expansion_cost(0, U256::from(u64::MAX), U256::one()),
			Err(GasOverflow)
		);
	}
}
