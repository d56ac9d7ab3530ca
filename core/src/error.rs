use core::fmt;

/// Exit result of running a frame to halt.
pub type ExitResult = Result<(), ExitError>;

/// Reason a frame was forcibly ended by the interpreter.
///
/// These are ordinary, expected outcomes of executing arbitrary bytecode.
/// The order in which the interpreter checks for them is fixed, see
/// `Evm::check_exceptional_halt`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionalHaltReason {
	/// Remaining gas is lower than the cost of the next operation.
	#[cfg_attr(feature = "with-codec", codec(index = 0))]
	InsufficientGas,
	/// The stack holds fewer items than the operation consumes.
	#[cfg_attr(feature = "with-codec", codec(index = 1))]
	InsufficientStackItems,
	/// Executing the operation would grow the stack over its limit.
	#[cfg_attr(feature = "with-codec", codec(index = 2))]
	TooManyStackItems,
	/// Jump target is not a `JUMPDEST` (or `BEGINSUB` for `JUMPSUB`).
	#[cfg_attr(feature = "with-codec", codec(index = 3))]
	InvalidJumpDestination,
	/// Opcode is not mapped for the code version, or is `INVALID`.
	#[cfg_attr(feature = "with-codec", codec(index = 4))]
	InvalidOperation,
	/// `RETURNDATACOPY` reads past the end of the return data buffer.
	#[cfg_attr(feature = "with-codec", codec(index = 5))]
	InvalidReturnDataBufferAccess,
	/// State modification attempted in a static context.
	#[cfg_attr(feature = "with-codec", codec(index = 6))]
	IllegalStateChange,
	/// Memory access beyond the configured memory limit.
	#[cfg_attr(feature = "with-codec", codec(index = 7))]
	OutOfBounds,
	/// `RETURNSUB` executed with an empty return stack.
	#[cfg_attr(feature = "with-codec", codec(index = 8))]
	InvalidRetsub,
	/// `JUMPSUB` executed with a full return stack.
	#[cfg_attr(feature = "with-codec", codec(index = 9))]
	TooManyReturnStackItems,
	/// The operation's cost does not fit into the gas width.
	#[cfg_attr(feature = "with-codec", codec(index = 10))]
	GasCostOverflow,
}

impl ExceptionalHaltReason {
	/// Human readable description, as reported by tracers.
	pub const fn description(&self) -> &'static str {
		match self {
			Self::InsufficientGas => "Out of gas",
			Self::InsufficientStackItems => "Stack underflow",
			Self::TooManyStackItems => "Stack overflow",
			Self::InvalidJumpDestination => "Bad jump destination",
			Self::InvalidOperation => "Bad instruction",
			Self::InvalidReturnDataBufferAccess => "Out of bounds",
			Self::IllegalStateChange => "Illegal state change",
			Self::OutOfBounds => "Out of bounds",
			Self::InvalidRetsub => "Invalid retsub",
			Self::TooManyReturnStackItems => "Return stack overflow",
			Self::GasCostOverflow => "Gas cost overflow",
		}
	}
}

impl fmt::Display for ExceptionalHaltReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.description())
	}
}

/// Errors that are never supposed to happen while running well-formed
/// operations. They indicate a bug in an operation or in the embedder and
/// abort the call instead of corrupting state.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitFatal {
	/// An operation proceeded to gas deduction without a known cost.
	GasCostUnavailable,
	/// An operation hit a halt condition that its preconditions should have
	/// ruled out.
	UncheckedHalt(ExceptionalHaltReason),
	/// A frame was asked to run while not executing.
	NotExecuting,
	/// A suspended frame carried no pending message, or a resumed frame was
	/// not suspended.
	UnhandledSuspension,
	/// Substate push/pop calls were not balanced.
	UnevenSubstate,
	/// Gas handed back by a child call overflowed the parent's gas.
	GasAccountingOverflow,
	/// A frame was moved out of `EXCEPTIONAL_HALT`, or into it without a
	/// halt reason.
	InvalidStateTransition,
}

impl From<ExceptionalHaltReason> for ExitFatal {
	fn from(reason: ExceptionalHaltReason) -> Self {
		Self::UncheckedHalt(reason)
	}
}

impl fmt::Display for ExitFatal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// Failure returned by `Evm::run_to_halt`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// The frame ended in `EXCEPTIONAL_HALT`.
	Exception(ExceptionalHaltReason),
	/// Internal invariant violation.
	Fatal(ExitFatal),
}

impl ExitError {
	pub fn halt_reason(&self) -> Option<ExceptionalHaltReason> {
		match self {
			Self::Exception(reason) => Some(*reason),
			Self::Fatal(_) => None,
		}
	}

	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}
}

impl From<ExceptionalHaltReason> for ExitError {
	fn from(reason: ExceptionalHaltReason) -> Self {
		Self::Exception(reason)
	}
}

impl From<ExitFatal> for ExitError {
	fn from(fatal: ExitFatal) -> Self {
		Self::Fatal(fatal)
	}
}

impl From<ExitError> for ExitResult {
	fn from(e: ExitError) -> Self {
		Err(e)
	}
}

impl fmt::Display for ExitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Exception(reason) => write!(f, "exceptional halt: {}", reason),
			Self::Fatal(fatal) => write!(f, "fatal: {}", fatal),
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ExitError {}

#[cfg(feature = "std")]
impl std::error::Error for ExitFatal {}
