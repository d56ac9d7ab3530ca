use evm_frame_core::{Gas, GasOverflow};
use primitive_types::{H256, U256};

use crate::consts::*;
use crate::memory::memory_expansion_cost;
use crate::utils::byte_len;

pub fn exp_cost(power: U256, byte_cost: u64) -> Result<Gas, GasOverflow> {
	Gas::new(byte_cost)
		.checked_mul(Gas::new(byte_len(power)))?
		.checked_add(Gas::new(G_EXP))
}

fn word_cost(per_word: u64, len: U256) -> Result<Gas, GasOverflow> {
	let words = len / 32 + if (len % 32).is_zero() { 0 } else { 1 };
	Gas::new(per_word).checked_mul(Gas::of(words)?)
}

pub fn verylowcopy_cost(active_words: usize, offset: U256, len: U256) -> Result<Gas, GasOverflow> {
	Gas::new(G_VERYLOW)
		.checked_add(word_cost(G_COPY, len)?)?
		.checked_add(memory_expansion_cost(active_words, offset, len)?)
}

pub fn sha3_cost(active_words: usize, offset: U256, len: U256) -> Result<Gas, GasOverflow> {
	Gas::new(G_SHA3)
		.checked_add(word_cost(G_SHA3WORD, len)?)?
		.checked_add(memory_expansion_cost(active_words, offset, len)?)
}

pub fn log_cost(active_words: usize, offset: U256, len: U256, topics: u8) -> Result<Gas, GasOverflow> {
	Gas::new(G_LOG)
		.checked_add(Gas::new(G_LOGDATA).checked_mul(Gas::of(len)?)?)?
		.checked_add(Gas::new(G_LOGTOPIC * u64::from(topics)))?
		.checked_add(memory_expansion_cost(active_words, offset, len)?)
}

pub fn sstore_cost_frontier(current: H256, new: H256) -> Gas {
	if new != H256::zero() && current == H256::zero() {
		Gas::new(G_SSET)
	} else {
		Gas::new(G_SRESET)
	}
}

pub fn sstore_refund_frontier(current: H256, new: H256) -> i64 {
	if current != H256::zero() && new == H256::zero() {
		R_SCLEAR
	} else {
		0
	}
}

/// EIP-2200 net gas metering.
pub fn sstore_cost_eip2200(original: H256, current: H256, new: H256, sload: u64) -> Gas {
	if new == current {
		Gas::new(sload)
	} else if original == current {
		if original == H256::zero() {
			Gas::new(G_SSET)
		} else {
			Gas::new(G_SRESET)
		}
	} else {
		Gas::new(sload)
	}
}

pub fn sstore_refund_eip2200(original: H256, current: H256, new: H256, sload: u64) -> i64 {
	if current == new {
		return 0;
	}

	if original == current {
		if original != H256::zero() && new == H256::zero() {
			return R_SCLEAR;
		}
		return 0;
	}

	let mut refund = 0;
	if original != H256::zero() {
		if current == H256::zero() {
			refund -= R_SCLEAR;
		} else if new == H256::zero() {
			refund += R_SCLEAR;
		}
	}

	if original == new {
		if original == H256::zero() {
			refund += (G_SSET - sload) as i64;
		} else {
			refund += (G_SRESET - sload) as i64;
		}
	}

	refund
}

/// All but one 64th of `gas` (EIP-150).
pub fn all_but_one_64th(gas: Gas) -> Gas {
	Gas::new(gas.as_u64() - gas.as_u64() / 64)
}
