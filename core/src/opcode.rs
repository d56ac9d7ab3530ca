/// Opcode byte. One-to-one corresponding to an `u8` value; whether it maps
/// to an operation depends on the registry and the code version.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode(pub u8);

// Stop and arithmetic.
impl Opcode {
	pub const STOP: Opcode = Opcode(0x00);
	pub const ADD: Opcode = Opcode(0x01);
	pub const MUL: Opcode = Opcode(0x02);
	pub const SUB: Opcode = Opcode(0x03);
	pub const DIV: Opcode = Opcode(0x04);
	pub const SDIV: Opcode = Opcode(0x05);
	pub const MOD: Opcode = Opcode(0x06);
	pub const SMOD: Opcode = Opcode(0x07);
	pub const ADDMOD: Opcode = Opcode(0x08);
	pub const MULMOD: Opcode = Opcode(0x09);
	pub const EXP: Opcode = Opcode(0x0a);
	pub const SIGNEXTEND: Opcode = Opcode(0x0b);
}

// Comparison and bitwise logic.
impl Opcode {
	pub const LT: Opcode = Opcode(0x10);
	pub const GT: Opcode = Opcode(0x11);
	pub const SLT: Opcode = Opcode(0x12);
	pub const SGT: Opcode = Opcode(0x13);
	pub const EQ: Opcode = Opcode(0x14);
	pub const ISZERO: Opcode = Opcode(0x15);
	pub const AND: Opcode = Opcode(0x16);
	pub const OR: Opcode = Opcode(0x17);
	pub const XOR: Opcode = Opcode(0x18);
	pub const NOT: Opcode = Opcode(0x19);
	pub const BYTE: Opcode = Opcode(0x1a);
	pub const SHL: Opcode = Opcode(0x1b);
	pub const SHR: Opcode = Opcode(0x1c);
	pub const SAR: Opcode = Opcode(0x1d);

	pub const SHA3: Opcode = Opcode(0x20);
}

// Environment and block information.
impl Opcode {
	pub const ADDRESS: Opcode = Opcode(0x30);
	pub const BALANCE: Opcode = Opcode(0x31);
	pub const ORIGIN: Opcode = Opcode(0x32);
	pub const CALLER: Opcode = Opcode(0x33);
	pub const CALLVALUE: Opcode = Opcode(0x34);
	pub const CALLDATALOAD: Opcode = Opcode(0x35);
	pub const CALLDATASIZE: Opcode = Opcode(0x36);
	pub const CALLDATACOPY: Opcode = Opcode(0x37);
	pub const CODESIZE: Opcode = Opcode(0x38);
	pub const CODECOPY: Opcode = Opcode(0x39);
	pub const GASPRICE: Opcode = Opcode(0x3a);
	pub const RETURNDATASIZE: Opcode = Opcode(0x3d);
	pub const RETURNDATACOPY: Opcode = Opcode(0x3e);

	pub const BLOCKHASH: Opcode = Opcode(0x40);
	pub const COINBASE: Opcode = Opcode(0x41);
	pub const TIMESTAMP: Opcode = Opcode(0x42);
	pub const NUMBER: Opcode = Opcode(0x43);
	pub const DIFFICULTY: Opcode = Opcode(0x44);
	pub const GASLIMIT: Opcode = Opcode(0x45);
	pub const CHAINID: Opcode = Opcode(0x46);
	pub const SELFBALANCE: Opcode = Opcode(0x47);
	pub const BASEFEE: Opcode = Opcode(0x48);
}

// Stack, memory, storage and flow.
impl Opcode {
	pub const POP: Opcode = Opcode(0x50);
	pub const MLOAD: Opcode = Opcode(0x51);
	pub const MSTORE: Opcode = Opcode(0x52);
	pub const MSTORE8: Opcode = Opcode(0x53);
	pub const SLOAD: Opcode = Opcode(0x54);
	pub const SSTORE: Opcode = Opcode(0x55);
	pub const JUMP: Opcode = Opcode(0x56);
	pub const JUMPI: Opcode = Opcode(0x57);
	pub const PC: Opcode = Opcode(0x58);
	pub const MSIZE: Opcode = Opcode(0x59);
	pub const GAS: Opcode = Opcode(0x5a);
	pub const JUMPDEST: Opcode = Opcode(0x5b);
	pub const BEGINSUB: Opcode = Opcode(0x5c);
	pub const RETURNSUB: Opcode = Opcode(0x5d);
	pub const JUMPSUB: Opcode = Opcode(0x5e);

	pub const PUSH1: Opcode = Opcode(0x60);
	pub const PUSH32: Opcode = Opcode(0x7f);
	pub const DUP1: Opcode = Opcode(0x80);
	pub const DUP16: Opcode = Opcode(0x8f);
	pub const SWAP1: Opcode = Opcode(0x90);
	pub const SWAP16: Opcode = Opcode(0x9f);

	pub const LOG0: Opcode = Opcode(0xa0);
	pub const LOG4: Opcode = Opcode(0xa4);
}

// System.
impl Opcode {
	pub const CALL: Opcode = Opcode(0xf1);
	pub const RETURN: Opcode = Opcode(0xf3);
	pub const DELEGATECALL: Opcode = Opcode(0xf4);
	pub const STATICCALL: Opcode = Opcode(0xfa);
	pub const REVERT: Opcode = Opcode(0xfd);
	pub const INVALID: Opcode = Opcode(0xfe);
}

impl Opcode {
	/// Number of immediate bytes if this is a `PUSHn`.
	#[inline]
	pub const fn is_push(&self) -> Option<u8> {
		let value = self.0;
		if value >= 0x60 && value <= 0x7f {
			Some(value - 0x60 + 1)
		} else {
			None
		}
	}

	#[inline]
	pub const fn as_u8(&self) -> u8 {
		self.0
	}

	#[inline]
	pub const fn as_usize(&self) -> usize {
		self.0 as usize
	}
}

impl core::fmt::Debug for Opcode {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		write!(f, "Opcode(0x{:02x})", self.0)
	}
}
