use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

use crate::code::DEFAULT_VERSION;
use crate::ExitFatal;

/// Transfer from source to target, with given value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
	/// Source address.
	pub source: H160,
	/// Target address.
	pub target: H160,
	/// Transfer value.
	pub value: U256,
}

/// How a world-state substate is folded back into its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeStrategy {
	/// Keep every change of the substate.
	Commit,
	/// Drop the substate (the call reverted).
	Revert,
	/// Drop the substate (the call halted exceptionally).
	Discard,
}

/// World-state view handed to operations.
///
/// The interpreter loop never touches it directly; only individual
/// operations (`SLOAD`, `SSTORE`, `BALANCE`, ...) and the message processor
/// do.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Host {
	/// Get balance of address.
	fn balance(&self, address: H160) -> U256;
	/// Get code of address.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get the account/code version of address.
	fn code_version(&self, _address: H160) -> u32 {
		DEFAULT_VERSION
	}
	/// Check whether an address exists.
	fn exists(&self, address: H160) -> bool;
	/// Check whether an address holds neither balance nor code (EIP-161).
	/// Nonces are not modelled, so they never make an account non-empty.
	fn is_empty(&self, address: H160) -> bool {
		self.balance(address).is_zero() && self.code(address).is_empty()
	}
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Get storage value of address at index as it was when the transaction
	/// started.
	fn original_storage(&self, address: H160, index: H256) -> H256;
	/// Get environmental block hash.
	fn block_hash(&self, number: U256) -> H256;

	/// Set storage value of address at index.
	fn set_storage(&mut self, address: H160, index: H256, value: H256);
	/// Move value between accounts. Returns `false` and leaves state
	/// untouched when the source cannot afford it.
	fn transfer(&mut self, transfer: &Transfer) -> bool;

	/// Open a nested substate for a child call.
	fn push_substate(&mut self);
	/// Close the innermost substate.
	fn pop_substate(&mut self, strategy: MergeStrategy) -> Result<(), ExitFatal>;
}
