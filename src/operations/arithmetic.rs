use core::convert::TryFrom;

use evm_frame_core::utils::I256;
use evm_frame_core::{Gas, GasOverflow, Host, MessageFrame, Opcode};
use primitive_types::{U256, U512};

use super::{binary, low_tier, mid_tier, peek, ternary, very_low_tier, Instruction, InstructionTable};

pub fn register(table: &mut InstructionTable<'_>) {
	table.put(table.instruction(Opcode::ADD, "ADD", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| a.overflowing_add(b).0)
	}));
	table.put(table.instruction(Opcode::MUL, "MUL", 2, 1, low_tier, |_, frame, _| {
		binary(frame, |a, b| a.overflowing_mul(b).0)
	}));
	table.put(table.instruction(Opcode::SUB, "SUB", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| a.overflowing_sub(b).0)
	}));
	table.put(table.instruction(Opcode::DIV, "DIV", 2, 1, low_tier, |_, frame, _| {
		binary(frame, div)
	}));
	table.put(table.instruction(Opcode::SDIV, "SDIV", 2, 1, low_tier, |_, frame, _| {
		binary(frame, sdiv)
	}));
	table.put(table.instruction(Opcode::MOD, "MOD", 2, 1, low_tier, |_, frame, _| {
		binary(frame, rem)
	}));
	table.put(table.instruction(Opcode::SMOD, "SMOD", 2, 1, low_tier, |_, frame, _| {
		binary(frame, srem)
	}));
	table.put(table.instruction(Opcode::ADDMOD, "ADDMOD", 3, 1, mid_tier, |_, frame, _| {
		ternary(frame, addmod)
	}));
	table.put(table.instruction(Opcode::MULMOD, "MULMOD", 3, 1, mid_tier, |_, frame, _| {
		ternary(frame, mulmod)
	}));
	table.put(table.instruction(Opcode::EXP, "EXP", 2, 1, exp_cost, |_, frame, _| {
		binary(frame, exp)
	}));
	table.put(table.instruction(Opcode::SIGNEXTEND, "SIGNEXTEND", 2, 1, low_tier, |_, frame, _| {
		binary(frame, signextend)
	}));
}

fn exp_cost(i: &Instruction, frame: &MessageFrame, _: &dyn Host) -> Result<Gas, GasOverflow> {
	i.calculator().exp_operation_gas_cost(peek(frame, 1))
}

pub fn div(op1: U256, op2: U256) -> U256 {
	if op2.is_zero() {
		U256::zero()
	} else {
		op1 / op2
	}
}

pub fn sdiv(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	(op1 / op2).into()
}

pub fn rem(op1: U256, op2: U256) -> U256 {
	if op2.is_zero() {
		U256::zero()
	} else {
		op1 % op2
	}
}

pub fn srem(op1: U256, op2: U256) -> U256 {
	if op2.is_zero() {
		return U256::zero();
	}

	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	(op1 % op2).into()
}

pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3.is_zero() {
		return U256::zero();
	}

	let v = (U512::from(op1) + U512::from(op2)) % U512::from(op3);
	U256::try_from(v).unwrap_or_default()
}

pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3.is_zero() {
		return U256::zero();
	}

	let v = (U512::from(op1) * U512::from(op2)) % U512::from(op3);
	U256::try_from(v).unwrap_or_default()
}

pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r = U256::one();

	while !op2.is_zero() {
		if op2.bit(0) {
			r = r.overflowing_mul(op1).0;
		}
		op2 = op2 >> 1usize;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		let bit_index = (8 * op1.low_u32() + 7) as usize;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	} else {
		op2
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn division_by_zero_is_zero() {
		assert_eq!(div(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(rem(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(sdiv(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(srem(U256::from(7), U256::zero()), U256::zero());
	}

	#[test]
	fn signed_division() {
		let minus_eight = U256::MAX - U256::from(7);
		let minus_two = U256::MAX - U256::one();
		assert_eq!(sdiv(minus_eight, U256::from(4)), minus_two);
		assert_eq!(srem(minus_eight, U256::from(3)), minus_two);
	}

	#[test]
	fn modular_arithmetic_does_not_overflow() {
		assert_eq!(addmod(U256::MAX, U256::from(2), U256::from(10)), U256::from(7));
		assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
	}

	#[test]
	fn exponentiation_wraps() {
		assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
		assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
		assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
	}

	#[test]
	fn sign_extension() {
		assert_eq!(signextend(U256::zero(), U256::from(0xff)), U256::MAX);
		assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
		assert_eq!(signextend(U256::from(32), U256::from(0xff)), U256::from(0xff));
	}
}
