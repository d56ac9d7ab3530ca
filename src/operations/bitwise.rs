use evm_frame_core::utils::{Sign, I256};
use evm_frame_core::Opcode;
use primitive_types::U256;

use super::{binary, bool_to_u256, unary, very_low_tier, InstructionTable};
use crate::Config;

pub fn register(table: &mut InstructionTable<'_>, config: &Config) {
	table.put(table.instruction(Opcode::LT, "LT", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| bool_to_u256(a < b))
	}));
	table.put(table.instruction(Opcode::GT, "GT", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| bool_to_u256(a > b))
	}));
	table.put(table.instruction(Opcode::SLT, "SLT", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, slt)
	}));
	table.put(table.instruction(Opcode::SGT, "SGT", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, sgt)
	}));
	table.put(table.instruction(Opcode::EQ, "EQ", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| bool_to_u256(a == b))
	}));
	table.put(table.instruction(Opcode::ISZERO, "ISZERO", 1, 1, very_low_tier, |_, frame, _| {
		unary(frame, |a| bool_to_u256(a.is_zero()))
	}));
	table.put(table.instruction(Opcode::AND, "AND", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| a & b)
	}));
	table.put(table.instruction(Opcode::OR, "OR", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| a | b)
	}));
	table.put(table.instruction(Opcode::XOR, "XOR", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, |a, b| a ^ b)
	}));
	table.put(table.instruction(Opcode::NOT, "NOT", 1, 1, very_low_tier, |_, frame, _| {
		unary(frame, |a| !a)
	}));
	table.put(table.instruction(Opcode::BYTE, "BYTE", 2, 1, very_low_tier, |_, frame, _| {
		binary(frame, byte)
	}));

	if config.eip145_bitwise_shifting {
		table.put(table.instruction(Opcode::SHL, "SHL", 2, 1, very_low_tier, |_, frame, _| {
			binary(frame, shl)
		}));
		table.put(table.instruction(Opcode::SHR, "SHR", 2, 1, very_low_tier, |_, frame, _| {
			binary(frame, shr)
		}));
		table.put(table.instruction(Opcode::SAR, "SAR", 2, 1, very_low_tier, |_, frame, _| {
			binary(frame, sar)
		}));
	}
}

pub fn slt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	bool_to_u256(op1 < op2)
}

pub fn sgt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	bool_to_u256(op1 > op2)
}

/// Byte `op1` of `op2`, counting from the most significant byte.
pub fn byte(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		U256::from(op2.byte(31 - op1.as_usize()))
	} else {
		U256::zero()
	}
}

pub fn shl(shift: U256, value: U256) -> U256 {
	if value.is_zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value << shift.as_usize()
	}
}

pub fn shr(shift: U256, value: U256) -> U256 {
	if value.is_zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value >> shift.as_usize()
	}
}

pub fn sar(shift: U256, value: U256) -> U256 {
	let value = I256::from(value);

	if value == I256::zero() || shift >= U256::from(256) {
		let I256(sign, _) = value;
		match sign {
			// value is 0 or >=1, pushing 0
			Sign::Plus | Sign::Zero => U256::zero(),
			// value is <0, pushing -1
			Sign::Minus => I256(Sign::Minus, U256::one()).into(),
		}
	} else {
		let shift = shift.as_usize();

		match value.0 {
			Sign::Plus | Sign::Zero => value.1 >> shift,
			Sign::Minus => {
				let shifted = ((value.1.overflowing_sub(U256::one()).0) >> shift)
					.overflowing_add(U256::one())
					.0;
				I256(Sign::Minus, shifted).into()
			}
		}
	}
}
