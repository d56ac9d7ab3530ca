use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use evm_frame_core::{ExitFatal, Host, MergeStrategy, Transfer};
use primitive_types::{H160, H256, U256};

use super::Backend;

/// Changes accumulated by an [`OverlayedBackend`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OverlayedChangeSet {
	pub balances: BTreeMap<H160, U256>,
	pub storages: BTreeMap<(H160, H256), H256>,
}

/// [`Host`] over a read-only backend. Writes go to the innermost substate;
/// reads fall through the substate chain to the backend.
pub struct OverlayedBackend<B> {
	backend: B,
	substate: Box<Substate>,
}

impl<B> OverlayedBackend<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			substate: Box::new(Substate::new()),
		}
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Number of substates opened and not yet closed.
	pub fn substate_depth(&self) -> usize {
		self.substate.depth()
	}

	pub fn deconstruct(self) -> (B, OverlayedChangeSet) {
		let substate = *self.substate;
		(
			self.backend,
			OverlayedChangeSet {
				balances: substate.balances,
				storages: substate.storages,
			},
		)
	}
}

impl<B: Backend> Host for OverlayedBackend<B> {
	fn balance(&self, address: H160) -> U256 {
		if let Some(balance) = self.substate.known_balance(address) {
			balance
		} else {
			self.backend.balance(address)
		}
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.backend.code(address)
	}

	fn code_version(&self, address: H160) -> u32 {
		self.backend.code_version(address)
	}

	fn exists(&self, address: H160) -> bool {
		self.substate.known_exists(address) || self.backend.exists(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		if let Some(value) = self.substate.known_storage(address, index) {
			value
		} else {
			self.backend.storage(address, index)
		}
	}

	fn original_storage(&self, address: H160, index: H256) -> H256 {
		self.backend.storage(address, index)
	}

	fn block_hash(&self, number: U256) -> H256 {
		self.backend.block_hash(number)
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		self.substate.storages.insert((address, index), value);
	}

	fn transfer(&mut self, transfer: &Transfer) -> bool {
		if transfer.value.is_zero() {
			return true;
		}

		let source_balance = self.balance(transfer.source);
		if source_balance < transfer.value {
			return false;
		}
		self.substate
			.balances
			.insert(transfer.source, source_balance - transfer.value);

		let target_balance = self.balance(transfer.target);
		self.substate
			.balances
			.insert(transfer.target, target_balance.saturating_add(transfer.value));
		true
	}

	fn push_substate(&mut self) {
		let mut parent = Box::new(Substate::new());
		mem::swap(&mut parent, &mut self.substate);
		self.substate.parent = Some(parent);
	}

	fn pop_substate(&mut self, strategy: MergeStrategy) -> Result<(), ExitFatal> {
		let mut child = self
			.substate
			.parent
			.take()
			.ok_or(ExitFatal::UnevenSubstate)?;
		mem::swap(&mut child, &mut self.substate);

		match strategy {
			MergeStrategy::Commit => {
				self.substate.balances.extend(child.balances);
				self.substate.storages.extend(child.storages);
			}
			MergeStrategy::Revert | MergeStrategy::Discard => (),
		}

		Ok(())
	}
}

struct Substate {
	parent: Option<Box<Substate>>,
	balances: BTreeMap<H160, U256>,
	storages: BTreeMap<(H160, H256), H256>,
}

impl Substate {
	fn new() -> Self {
		Self {
			parent: None,
			balances: BTreeMap::new(),
			storages: BTreeMap::new(),
		}
	}

	fn depth(&self) -> usize {
		match self.parent.as_ref() {
			Some(parent) => parent.depth() + 1,
			None => 0,
		}
	}

	fn known_balance(&self, address: H160) -> Option<U256> {
		if let Some(balance) = self.balances.get(&address) {
			Some(*balance)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_balance(address)
		} else {
			None
		}
	}

	fn known_storage(&self, address: H160, index: H256) -> Option<H256> {
		if let Some(value) = self.storages.get(&(address, index)) {
			Some(*value)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_storage(address, index)
		} else {
			None
		}
	}

	fn known_exists(&self, address: H160) -> bool {
		self.balances.contains_key(&address)
			|| self
				.parent
				.as_ref()
				.map_or(false, |parent| parent.known_exists(address))
	}
}
