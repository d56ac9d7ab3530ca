use core::fmt;
use primitive_types::U256;

/// Gas cost or gas amount does not fit into the 64-bit gas width.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GasOverflow;

impl fmt::Display for GasOverflow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("gas overflow")
	}
}

#[cfg(feature = "std")]
impl std::error::Error for GasOverflow {}

/// An amount of gas.
///
/// All arithmetic is checked: anything that would leave the 64-bit range
/// returns [`GasOverflow`] instead of wrapping.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gas(u64);

impl Gas {
	pub const ZERO: Gas = Gas(0);
	pub const MAX: Gas = Gas(u64::MAX);

	#[inline]
	pub const fn new(value: u64) -> Self {
		Self(value)
	}

	/// Convert a stack word into gas.
	pub fn of(value: U256) -> Result<Self, GasOverflow> {
		if value > U256::from(u64::MAX) {
			return Err(GasOverflow);
		}
		Ok(Self(value.low_u64()))
	}

	#[inline]
	pub const fn as_u64(&self) -> u64 {
		self.0
	}

	#[inline]
	pub fn as_u256(&self) -> U256 {
		U256::from(self.0)
	}

	#[inline]
	pub const fn is_zero(&self) -> bool {
		self.0 == 0
	}

	pub fn checked_add(self, other: Gas) -> Result<Gas, GasOverflow> {
		self.0.checked_add(other.0).map(Gas).ok_or(GasOverflow)
	}

	pub fn checked_sub(self, other: Gas) -> Result<Gas, GasOverflow> {
		self.0.checked_sub(other.0).map(Gas).ok_or(GasOverflow)
	}

	pub fn checked_mul(self, other: Gas) -> Result<Gas, GasOverflow> {
		self.0.checked_mul(other.0).map(Gas).ok_or(GasOverflow)
	}

	pub fn saturating_sub(self, other: Gas) -> Gas {
		Gas(self.0.saturating_sub(other.0))
	}

	pub fn min(self, other: Gas) -> Gas {
		Gas(core::cmp::min(self.0, other.0))
	}
}

impl From<u64> for Gas {
	fn from(value: u64) -> Self {
		Self(value)
	}
}

impl From<u32> for Gas {
	fn from(value: u32) -> Self {
		Self(u64::from(value))
	}
}

impl fmt::Display for Gas {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{:x}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn of_rejects_values_wider_than_64_bits() {
		assert_eq!(Gas::of(U256::from(u64::MAX)), Ok(Gas::MAX));
		assert_eq!(Gas::of(U256::from(u64::MAX) + 1), Err(GasOverflow));
	}

	#[test]
	fn arithmetic_is_checked() {
		assert_eq!(Gas::MAX.checked_add(Gas::new(1)), Err(GasOverflow));
		assert_eq!(Gas::new(1).checked_sub(Gas::new(2)), Err(GasOverflow));
		assert_eq!(Gas::MAX.checked_mul(Gas::new(2)), Err(GasOverflow));
		assert_eq!(Gas::new(3).checked_mul(Gas::new(4)), Ok(Gas::new(12)));
		assert_eq!(Gas::new(1).saturating_sub(Gas::new(2)), Gas::ZERO);
	}
}
