//! World-state backends. [`OverlayedBackend`] implements the [`Host`]
//! interface on top of any read-only [`Backend`], keeping changes in nested
//! substates until they are committed or dropped.
//!
//! [`Host`]: evm_frame_core::Host

mod memory;
mod overlayed;

pub use self::memory::{MemoryAccount, MemoryBackend};
pub use self::overlayed::{OverlayedBackend, OverlayedChangeSet};

use alloc::vec::Vec;
use evm_frame_core::DEFAULT_VERSION;
use primitive_types::{H160, H256, U256};

/// Read-only world state.
#[auto_impl::auto_impl(&, Box)]
pub trait Backend {
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
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Get environmental block hash.
	fn block_hash(&self, number: U256) -> H256;
}
