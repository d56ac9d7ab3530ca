//! Fee schedules of the evm-frame execution engine.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

mod consts;
mod costs;
mod memory;
mod utils;

pub use crate::memory::{memory_expansion_cost, memory_gas};

use core::fmt::Debug;
use evm_frame_core::{Gas, GasOverflow};
use primitive_types::{H256, U256};

/// Constants that differ between protocol versions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeSchedule {
	/// Gas paid for `SLOAD`.
	pub gas_sload: u64,
	/// Gas paid for `BALANCE`.
	pub gas_balance: u64,
	/// Base gas paid for `CALL`-class opcodes.
	pub gas_call: u64,
	/// Gas paid for each byte of an `EXP` exponent.
	pub gas_expbyte: u64,
	/// EIP-2200 net gas metering for `SSTORE`.
	pub sstore_net_metering: bool,
	/// EIP-150: a child call gets at most all but one 64th of the gas left.
	pub call_all_but_one_64th: bool,
	/// Before EIP-161 a call to a missing account pays for creating it even
	/// when no value is sent.
	pub empty_considered_exists: bool,
}

impl FeeSchedule {
	pub const fn frontier() -> Self {
		Self {
			gas_sload: consts::G_SLOAD_FRONTIER,
			gas_balance: consts::G_BALANCE_FRONTIER,
			gas_call: consts::G_CALL_FRONTIER,
			gas_expbyte: consts::G_EXPBYTE_FRONTIER,
			sstore_net_metering: false,
			call_all_but_one_64th: false,
			empty_considered_exists: true,
		}
	}

	pub const fn istanbul() -> Self {
		Self {
			gas_sload: consts::G_SLOAD_EIP1884,
			gas_balance: consts::G_BALANCE_EIP1884,
			gas_call: consts::G_CALL_EIP150,
			gas_expbyte: consts::G_EXPBYTE_EIP160,
			sstore_net_metering: true,
			call_all_but_one_64th: true,
			empty_considered_exists: false,
		}
	}
}

/// Maps operations to their gas cost under one protocol version.
///
/// Implementations are stateless and shared read-only by every frame that
/// runs under the version. Every method is a pure function of its
/// arguments; memory-touching costs take the frame's current active word
/// count and the range the operation is about to touch.
pub trait GasCalculator: Send + Sync + Debug {
	/// Version specific constants.
	fn schedule(&self) -> &FeeSchedule;

	fn zero_tier_gas_cost(&self) -> Gas {
		Gas::new(consts::G_ZERO)
	}

	fn base_tier_gas_cost(&self) -> Gas {
		Gas::new(consts::G_BASE)
	}

	fn very_low_tier_gas_cost(&self) -> Gas {
		Gas::new(consts::G_VERYLOW)
	}

	fn low_tier_gas_cost(&self) -> Gas {
		Gas::new(consts::G_LOW)
	}

	fn mid_tier_gas_cost(&self) -> Gas {
		Gas::new(consts::G_MID)
	}

	fn high_tier_gas_cost(&self) -> Gas {
		Gas::new(consts::G_HIGH)
	}

	fn jump_dest_operation_gas_cost(&self) -> Gas {
		Gas::new(consts::G_JUMPDEST)
	}

	fn block_hash_operation_gas_cost(&self) -> Gas {
		Gas::new(consts::G_BLOCKHASH)
	}

	fn exp_operation_gas_cost(&self, power: U256) -> Result<Gas, GasOverflow> {
		costs::exp_cost(power, self.schedule().gas_expbyte)
	}

	/// Cost of growing memory to cover `offset..offset + len`.
	fn memory_expansion_gas_cost(
		&self,
		active_words: usize,
		offset: U256,
		len: U256,
	) -> Result<Gas, GasOverflow> {
		memory::memory_expansion_cost(active_words, offset, len)
	}

	/// `MLOAD`/`MSTORE`/`MSTORE8`: very low tier plus memory expansion.
	fn memory_operation_gas_cost(
		&self,
		active_words: usize,
		offset: U256,
		len: U256,
	) -> Result<Gas, GasOverflow> {
		self.very_low_tier_gas_cost()
			.checked_add(self.memory_expansion_gas_cost(active_words, offset, len)?)
	}

	/// `CALLDATACOPY`, `CODECOPY`, `RETURNDATACOPY`.
	fn data_copy_operation_gas_cost(
		&self,
		active_words: usize,
		offset: U256,
		len: U256,
	) -> Result<Gas, GasOverflow> {
		costs::verylowcopy_cost(active_words, offset, len)
	}

	fn sha3_operation_gas_cost(
		&self,
		active_words: usize,
		offset: U256,
		len: U256,
	) -> Result<Gas, GasOverflow> {
		costs::sha3_cost(active_words, offset, len)
	}

	fn log_operation_gas_cost(
		&self,
		active_words: usize,
		offset: U256,
		len: U256,
		topics: u8,
	) -> Result<Gas, GasOverflow> {
		costs::log_cost(active_words, offset, len, topics)
	}

	fn sload_operation_gas_cost(&self) -> Gas {
		Gas::new(self.schedule().gas_sload)
	}

	fn sstore_operation_gas_cost(&self, original: H256, current: H256, new: H256) -> Gas {
		let schedule = self.schedule();
		if schedule.sstore_net_metering {
			costs::sstore_cost_eip2200(original, current, new, schedule.gas_sload)
		} else {
			costs::sstore_cost_frontier(current, new)
		}
	}

	/// Refund granted (or, when negative, taken back) by an `SSTORE`.
	fn sstore_refund(&self, original: H256, current: H256, new: H256) -> i64 {
		let schedule = self.schedule();
		if schedule.sstore_net_metering {
			costs::sstore_refund_eip2200(original, current, new, schedule.gas_sload)
		} else {
			costs::sstore_refund_frontier(current, new)
		}
	}

	/// `SSTORE` is refused outright while this much gas or less is left.
	fn sstore_sentry_gas(&self) -> Option<Gas> {
		if self.schedule().sstore_net_metering {
			Some(Gas::new(consts::G_SSTORE_SENTRY))
		} else {
			None
		}
	}

	fn balance_operation_gas_cost(&self) -> Gas {
		Gas::new(self.schedule().gas_balance)
	}

	fn self_balance_operation_gas_cost(&self) -> Gas {
		Gas::new(consts::G_SELFBALANCE)
	}

	fn call_operation_base_gas_cost(&self) -> Gas {
		Gas::new(self.schedule().gas_call)
	}

	fn call_value_transfer_gas_cost(&self) -> Gas {
		Gas::new(consts::G_CALLVALUE)
	}

	fn new_account_gas_cost(&self) -> Gas {
		Gas::new(consts::G_NEWACCOUNT)
	}

	/// Free gas added to a child call that receives value.
	fn additional_call_stipend(&self) -> Gas {
		Gas::new(consts::G_CALLSTIPEND)
	}

	/// Gas a child call gets out of `requested`, given the gas the parent
	/// has left once the call's own cost is paid.
	fn gas_available_for_child_call(
		&self,
		remaining: Gas,
		requested: U256,
	) -> Result<Gas, GasOverflow> {
		if self.schedule().call_all_but_one_64th {
			let cap = costs::all_but_one_64th(remaining);
			if requested > cap.as_u256() {
				Ok(cap)
			} else {
				Gas::of(requested)
			}
		} else {
			Gas::of(requested)
		}
	}

	/// Cost of a `CALL`-class operation, excluding the gas forwarded to the
	/// child.
	fn call_operation_gas_cost(
		&self,
		memory_cost: Gas,
		transfers_value: bool,
		recipient_is_new: bool,
	) -> Result<Gas, GasOverflow> {
		let mut cost = self.call_operation_base_gas_cost().checked_add(memory_cost)?;
		if transfers_value {
			cost = cost.checked_add(self.call_value_transfer_gas_cost())?;
		}
		if recipient_is_new && (transfers_value || self.schedule().empty_considered_exists) {
			cost = cost.checked_add(self.new_account_gas_cost())?;
		}
		Ok(cost)
	}

	fn begin_sub_gas_cost(&self) -> Gas {
		Gas::new(consts::G_BEGINSUB)
	}

	fn jump_sub_gas_cost(&self) -> Gas {
		Gas::new(consts::G_JUMPSUB)
	}

	fn ret_sub_gas_cost(&self) -> Gas {
		Gas::new(consts::G_RETURNSUB)
	}
}

/// Fee schedule of the first protocol version.
#[derive(Clone, Debug)]
pub struct FrontierGasCalculator {
	schedule: FeeSchedule,
}

impl FrontierGasCalculator {
	pub const fn new() -> Self {
		Self {
			schedule: FeeSchedule::frontier(),
		}
	}
}

impl Default for FrontierGasCalculator {
	fn default() -> Self {
		Self::new()
	}
}

impl GasCalculator for FrontierGasCalculator {
	fn schedule(&self) -> &FeeSchedule {
		&self.schedule
	}
}

/// Istanbul fee schedule: EIP-150 call gas, EIP-1884 repricing and EIP-2200
/// net metered `SSTORE`.
#[derive(Clone, Debug)]
pub struct IstanbulGasCalculator {
	schedule: FeeSchedule,
}

impl IstanbulGasCalculator {
	pub const fn new() -> Self {
		Self {
			schedule: FeeSchedule::istanbul(),
		}
	}
}

impl Default for IstanbulGasCalculator {
	fn default() -> Self {
		Self::new()
	}
}

impl GasCalculator for IstanbulGasCalculator {
	fn schedule(&self) -> &FeeSchedule {
		&self.schedule
	}
}

/// Berlin fee schedule as scheduled here: Istanbul pricing, with the
/// EIP-2315 subroutine opcodes enabled by the matching registry.
#[derive(Clone, Debug)]
pub struct BerlinGasCalculator {
	schedule: FeeSchedule,
}

impl BerlinGasCalculator {
	pub const fn new() -> Self {
		Self {
			schedule: FeeSchedule::istanbul(),
		}
	}
}

impl Default for BerlinGasCalculator {
	fn default() -> Self {
		Self::new()
	}
}

impl GasCalculator for BerlinGasCalculator {
	fn schedule(&self) -> &FeeSchedule {
		&self.schedule
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn versions_reprice_state_access() {
		let frontier = FrontierGasCalculator::new();
		let istanbul = IstanbulGasCalculator::new();
		assert_eq!(frontier.sload_operation_gas_cost(), Gas::new(50));
		assert_eq!(istanbul.sload_operation_gas_cost(), Gas::new(800));
		assert_eq!(frontier.balance_operation_gas_cost(), Gas::new(20));
		assert_eq!(istanbul.balance_operation_gas_cost(), Gas::new(700));
		assert_eq!(frontier.call_operation_base_gas_cost(), Gas::new(40));
		assert_eq!(istanbul.call_operation_base_gas_cost(), Gas::new(700));
		assert_eq!(frontier.sstore_sentry_gas(), None);
		assert_eq!(istanbul.sstore_sentry_gas(), Some(Gas::new(2300)));
	}

	#[test]
	fn child_gas_is_capped_after_eip150() {
		let frontier = FrontierGasCalculator::new();
		let istanbul = IstanbulGasCalculator::new();
		let requested = U256::from(10_000);

		assert_eq!(
			frontier.gas_available_for_child_call(Gas::new(6400), requested),
			Ok(Gas::new(10_000))
		);
		assert_eq!(
			istanbul.gas_available_for_child_call(Gas::new(6400), requested),
			Ok(Gas::new(6300))
		);
		assert_eq!(
			istanbul.gas_available_for_child_call(Gas::new(6400), U256::from(100)),
			Ok(Gas::new(100))
		);
		assert_eq!(
			frontier.gas_available_for_child_call(Gas::new(6400), U256::MAX),
			Err(GasOverflow)
		);
		assert_eq!(
			istanbul.gas_available_for_child_call(Gas::new(6400), U256::MAX),
			Ok(Gas::new(6300))
		);
	}

	#[test]
	fn call_cost_adds_value_transfer_and_new_account() {
		let istanbul = IstanbulGasCalculator::new();
		assert_eq!(
			istanbul.call_operation_gas_cost(Gas::new(3), false, true),
			Ok(Gas::new(703))
		);
		assert_eq!(
			istanbul.call_operation_gas_cost(Gas::ZERO, true, true),
			Ok(Gas::new(700 + 9000 + 25000))
		);

		let frontier = FrontierGasCalculator::new();
		assert_eq!(
			frontier.call_operation_gas_cost(Gas::ZERO, false, true),
			Ok(Gas::new(40 + 25000))
		);
	}

	#[test]
	fn subroutine_costs() {
		let berlin = BerlinGasCalculator::new();
		assert_eq!(berlin.begin_sub_gas_cost(), Gas::new(1));
		assert_eq!(berlin.ret_sub_gas_cost(), Gas::new(5));
		assert_eq!(berlin.jump_sub_gas_cost(), Gas::new(10));
		assert_eq!(berlin.sload_operation_gas_cost(), Gas::new(800));
	}
}
