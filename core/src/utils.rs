//! Small utilities.

use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::{H160, H256, U256};

/// Precalculated `usize::MAX` for `U256`.
pub const USIZE_MAX: U256 = U256([usize::MAX as u64, 0, 0, 0]);

/// Every bit set except the sign bit.
pub const SIGN_BIT_MASK: U256 = U256([
	0xffffffffffffffff,
	0xffffffffffffffff,
	0xffffffffffffffff,
	0x7fffffffffffffff,
]);

pub fn u256_to_h256(v: U256) -> H256 {
	let mut r = H256::default();
	v.to_big_endian(&mut r[..]);
	r
}

pub fn h256_to_u256(v: H256) -> U256 {
	U256::from_big_endian(&v[..])
}

/// Lower 160 bits of a word as an address.
pub fn u256_to_h160(v: U256) -> H160 {
	H160::from(u256_to_h256(v))
}

pub fn h160_to_u256(v: H160) -> U256 {
	U256::from_big_endian(&v[..])
}

/// Convert to `usize`, `None` when it does not fit.
pub fn u256_to_usize(v: U256) -> Option<usize> {
	if v > USIZE_MAX {
		None
	} else {
		Some(v.as_usize())
	}
}

/// Sign of [I256].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Sign {
	Plus,
	Minus,
	Zero,
}

/// Signed 256-bit integer in sign/magnitude form.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct I256(pub Sign, pub U256);

impl I256 {
	pub fn zero() -> I256 {
		I256(Sign::Zero, U256::zero())
	}

	pub fn min_value() -> I256 {
		I256(Sign::Minus, (U256::MAX & SIGN_BIT_MASK) + U256::one())
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &I256) -> Ordering {
		match (self.0, other.0) {
			(Sign::Zero, Sign::Zero) => Ordering::Equal,
			(Sign::Zero, Sign::Plus) => Ordering::Less,
			(Sign::Zero, Sign::Minus) => Ordering::Greater,
			(Sign::Minus, Sign::Zero) => Ordering::Less,
			(Sign::Minus, Sign::Plus) => Ordering::Less,
			(Sign::Minus, Sign::Minus) => self.1.cmp(&other.1).reverse(),
			(Sign::Plus, Sign::Minus) => Ordering::Greater,
			(Sign::Plus, Sign::Zero) => Ordering::Greater,
			(Sign::Plus, Sign::Plus) => self.1.cmp(&other.1),
		}
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &I256) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Default for I256 {
	fn default() -> I256 {
		I256::zero()
	}
}

impl From<U256> for I256 {
	fn from(val: U256) -> I256 {
		if val.is_zero() {
			I256::zero()
		} else if val & SIGN_BIT_MASK == val {
			I256(Sign::Plus, val)
		} else {
			I256(Sign::Minus, (!val).overflowing_add(U256::one()).0)
		}
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> U256 {
		match value.0 {
			Sign::Zero => U256::zero(),
			Sign::Plus => value.1,
			Sign::Minus => (!value.1).overflowing_add(U256::one()).0,
		}
	}
}

impl Div for I256 {
	type Output = I256;

	fn div(self, other: I256) -> I256 {
		if other == I256::zero() {
			return I256::zero();
		}

		if self == I256::min_value() && other.1 == U256::one() {
			return I256::min_value();
		}

		let d = (self.1 / other.1) & SIGN_BIT_MASK;

		if d.is_zero() {
			return I256::zero();
		}

		match (self.0, other.0) {
			(Sign::Plus, Sign::Plus) | (Sign::Minus, Sign::Minus) => I256(Sign::Plus, d),
			_ => I256(Sign::Minus, d),
		}
	}
}

impl Rem for I256 {
	type Output = I256;

	fn rem(self, other: I256) -> I256 {
		if other.1.is_zero() {
			return I256::zero();
		}

		let r = (self.1 % other.1) & SIGN_BIT_MASK;

		if r.is_zero() {
			return I256::zero();
		}

		I256(self.0, r)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn div_i256() {
		let one = I256(Sign::Plus, U256::one());
		let minus_one = I256(Sign::Minus, U256::one());
		let one_hundred = I256(Sign::Plus, U256::from(100));
		let neg_one_hundred = I256(Sign::Minus, U256::from(100));
		let two = I256(Sign::Plus, U256::from(2));
		let fifty = I256(Sign::Plus, U256::from(50));

		assert_eq!(I256::min_value() / minus_one, I256::min_value());
		assert_eq!(I256::min_value() / one, I256::min_value());
		assert_eq!(one_hundred / minus_one, neg_one_hundred);
		assert_eq!(one_hundred / two, fifty);
		assert_eq!(one_hundred / I256::zero(), I256::zero());
	}

	#[test]
	fn twos_complement_round_trip() {
		let minus_one = U256::MAX;
		let signed = I256::from(minus_one);
		assert_eq!(signed, I256(Sign::Minus, U256::one()));
		assert_eq!(U256::from(signed), minus_one);
	}
}
