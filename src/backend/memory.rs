use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use evm_frame_core::DEFAULT_VERSION;
use primitive_types::{H160, H256, U256};

use super::{Backend, OverlayedChangeSet};

/// Account value of a memory backend.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryAccount {
	/// Account balance.
	pub balance: U256,
	/// Full account storage.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
	/// Code version.
	pub code_version: u32,
}

impl Default for MemoryAccount {
	fn default() -> Self {
		Self {
			balance: U256::zero(),
			storage: BTreeMap::new(),
			code: Vec::new(),
			code_version: DEFAULT_VERSION,
		}
	}
}

/// Memory backend, storing all state values in a `BTreeMap` in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
	accounts: BTreeMap<H160, MemoryAccount>,
	block_hashes: BTreeMap<U256, H256>,
}

impl MemoryBackend {
	/// Create a new memory backend.
	pub fn new(accounts: BTreeMap<H160, MemoryAccount>) -> Self {
		Self {
			accounts,
			block_hashes: BTreeMap::new(),
		}
	}

	/// Get the underlying `BTreeMap` storing the state.
	pub fn accounts(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.accounts
	}

	pub fn insert_account(&mut self, address: H160, account: MemoryAccount) {
		self.accounts.insert(address, account);
	}

	pub fn insert_block_hash(&mut self, number: U256, hash: H256) {
		self.block_hashes.insert(number, hash);
	}

	/// Apply the changes of a finished transaction.
	pub fn apply(&mut self, changes: OverlayedChangeSet) {
		for (address, balance) in changes.balances {
			self.accounts.entry(address).or_default().balance = balance;
		}

		for ((address, index), value) in changes.storages {
			let storage = &mut self.accounts.entry(address).or_default().storage;
			if value == H256::default() {
				storage.remove(&index);
			} else {
				storage.insert(index, value);
			}
		}
	}
}

impl Backend for MemoryBackend {
	fn balance(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map(|account| account.balance)
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.accounts
			.get(&address)
			.map(|account| account.code.clone())
			.unwrap_or_default()
	}

	fn code_version(&self, address: H160) -> u32 {
		self.accounts
			.get(&address)
			.map(|account| account.code_version)
			.unwrap_or(DEFAULT_VERSION)
	}

	fn exists(&self, address: H160) -> bool {
		self.accounts.contains_key(&address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|account| account.storage.get(&index).copied())
			.unwrap_or_default()
	}

	fn block_hash(&self, number: U256) -> H256 {
		self.block_hashes.get(&number).copied().unwrap_or_default()
	}
}
