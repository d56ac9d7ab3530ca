use alloc::sync::Arc;
use evm_frame_core::{
	DEFAULT_MAX_RETURN_STACK_SIZE, DEFAULT_MAX_STACK_SIZE, DEFAULT_MEMORY_LIMIT, DEFAULT_VERSION,
};
use evm_frame_gasometer::{
	BerlinGasCalculator, FrontierGasCalculator, GasCalculator, IstanbulGasCalculator,
};

use crate::operations::{self, InstructionTable};
use crate::OperationRegistry;

/// Default limit of nested message calls.
pub const DEFAULT_CALL_STACK_LIMIT: usize = 1024;

/// Fee schedule a configuration prices operations with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GasSchedule {
	Frontier,
	Istanbul,
	Berlin,
}

/// Protocol configuration.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Config {
	/// Operand stack limit.
	pub max_stack_size: usize,
	/// Subroutine return stack limit.
	pub max_return_stack_size: usize,
	/// Memory limit in bytes.
	pub memory_limit: usize,
	/// Maximum depth of nested message calls.
	pub call_stack_limit: usize,
	/// Fee schedule.
	pub gas_schedule: GasSchedule,
	/// Has delegate call.
	pub eip7_delegate_call: bool,
	/// Has revert.
	pub eip140_revert: bool,
	/// Has return data.
	pub eip211_return_data: bool,
	/// Static call.
	pub eip214_static_call: bool,
	/// Has bitwise shifting.
	pub eip145_bitwise_shifting: bool,
	/// Has chain ID.
	pub eip1344_chain_id: bool,
	/// Has self balance.
	pub eip1884_self_balance: bool,
	/// Has ext block fee. See [EIP-3198](https://github.com/ethereum/EIPs/blob/master/EIPS/eip-3198.md)
	pub eip3198_base_fee: bool,
	/// Subroutines. See [EIP-2315](https://github.com/ethereum/EIPs/blob/master/EIPS/eip-2315.md)
	pub eip2315_subroutines: bool,
}

impl Config {
	/// Frontier hard fork configuration.
	pub const fn frontier() -> Config {
		Config {
			max_stack_size: DEFAULT_MAX_STACK_SIZE,
			max_return_stack_size: DEFAULT_MAX_RETURN_STACK_SIZE,
			memory_limit: DEFAULT_MEMORY_LIMIT,
			call_stack_limit: DEFAULT_CALL_STACK_LIMIT,
			gas_schedule: GasSchedule::Frontier,
			eip7_delegate_call: false,
			eip140_revert: false,
			eip211_return_data: false,
			eip214_static_call: false,
			eip145_bitwise_shifting: false,
			eip1344_chain_id: false,
			eip1884_self_balance: false,
			eip3198_base_fee: false,
			eip2315_subroutines: false,
		}
	}

	/// Istanbul hard fork configuration.
	pub const fn istanbul() -> Config {
		Config {
			max_stack_size: DEFAULT_MAX_STACK_SIZE,
			max_return_stack_size: DEFAULT_MAX_RETURN_STACK_SIZE,
			memory_limit: DEFAULT_MEMORY_LIMIT,
			call_stack_limit: DEFAULT_CALL_STACK_LIMIT,
			gas_schedule: GasSchedule::Istanbul,
			eip7_delegate_call: true,
			eip140_revert: true,
			eip211_return_data: true,
			eip214_static_call: true,
			eip145_bitwise_shifting: true,
			eip1344_chain_id: true,
			eip1884_self_balance: true,
			eip3198_base_fee: false,
			eip2315_subroutines: false,
		}
	}

	/// Berlin hard fork configuration, with subroutines.
	pub const fn berlin() -> Config {
		let mut config = Self::istanbul();
		config.gas_schedule = GasSchedule::Berlin;
		config.eip2315_subroutines = true;
		config
	}

	/// London hard fork configuration.
	pub const fn london() -> Config {
		let mut config = Self::berlin();
		config.eip3198_base_fee = true;
		config
	}

	/// Calculator for the configured fee schedule.
	pub fn gas_calculator(&self) -> Arc<dyn GasCalculator> {
		match self.gas_schedule {
			GasSchedule::Frontier => Arc::new(FrontierGasCalculator::new()),
			GasSchedule::Istanbul => Arc::new(IstanbulGasCalculator::new()),
			GasSchedule::Berlin => Arc::new(BerlinGasCalculator::new()),
		}
	}

	/// Instruction set enabled by this configuration, for the default code
	/// version.
	pub fn operation_registry(&self) -> OperationRegistry {
		let mut registry = OperationRegistry::new();
		let mut table = InstructionTable::new(&mut registry, self.gas_calculator(), DEFAULT_VERSION);
		operations::register(&mut table, self);
		registry
	}
}
