use primitive_types::U256;

/// Number of significant bytes of `value`, as charged by `EXP`.
pub fn byte_len(value: U256) -> u64 {
	(value.bits() as u64 + 7) / 8
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_significant_bytes() {
		assert_eq!(byte_len(U256::zero()), 0);
		assert_eq!(byte_len(U256::from(0xff)), 1);
		assert_eq!(byte_len(U256::from(0x100)), 2);
		assert_eq!(byte_len(U256::MAX), 32);
	}
}
