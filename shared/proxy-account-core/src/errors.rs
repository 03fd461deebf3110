use alloc::{string::ToString, vec::Vec};

use alloy_primitives::Address;
use alloy_sol_types::{Revert, SolError};
use thiserror::Error;

/// Coarse classification shared by every failure the core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the role required for the mutation.
    Unauthorized,
    /// Executor already has an adder on record.
    AlreadyClaimed,
    /// Target address already holds code.
    AlreadyDeployed,
    /// Bytecode inconsistent with the proxy layout.
    MalformedBytecode,
}

/// Access registry rejections. The display strings are the revert reasons callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("ExecutorAccessController: Only the owner can call this function")]
    NotOwner,
    #[error("ExecutorAccessController: Only an admin can call this function")]
    NotAdmin,
    #[error("ExecutorAccessController: Address cannot remove an executor they did not add")]
    NotAdder,
    #[error("ExecutorAccessController: Address given already has an admin associated with it")]
    AlreadyClaimed,
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::NotOwner | AccessError::NotAdmin | AccessError::NotAdder => {
                ErrorKind::Unauthorized
            }
            AccessError::AlreadyClaimed => ErrorKind::AlreadyClaimed,
        }
    }
}

/// ABI-encoded `Error(string)` revert payload carrying the error's reason.
pub fn revert_data(err: &AccessError) -> Vec<u8> {
    Revert {
        reason: err.to_string(),
    }
    .abi_encode()
}

/// Errors while decoding proxy bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed bytecode: truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("malformed bytecode: expected 0x{expected:02x} at offset {offset}, found 0x{found:02x}")]
    UnexpectedByte { offset: usize, expected: u8, found: u8 },
    #[error("malformed bytecode: 0x{found:02x} at offset {offset} is not PUSH0..PUSH20")]
    InvalidPushWidth { offset: usize, found: u8 },
    #[error("malformed bytecode: implementation is not zero-stripped at offset {offset}")]
    LeadingZeroByte { offset: usize },
    #[error("malformed bytecode: expected {expected} bytes, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("malformed bytecode: unknown opcode 0x{byte:02x} at offset {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedBytecode
    }
}

/// Faults raised by the proxy interpreter. These correspond to exceptional halts in the EVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("unsupported opcode 0x{byte:02x} at pc {pc}")]
    UnsupportedOpcode { pc: usize, byte: u8 },
    #[error("stack underflow at pc {pc}")]
    StackUnderflow { pc: usize },
    #[error("stack overflow at pc {pc}")]
    StackOverflow { pc: usize },
    #[error("invalid jump destination {dest} at pc {pc}")]
    InvalidJump { pc: usize, dest: usize },
    #[error("memory access beyond limit at pc {pc}")]
    MemoryLimit { pc: usize },
    #[error("return data out of bounds at pc {pc}")]
    ReturnDataOutOfBounds { pc: usize },
    #[error("step limit exceeded")]
    StepLimit,
}

/// Account factory failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("AccountFactory: account already deployed at {address}")]
    AlreadyDeployed { address: Address },
    #[error("AccountFactory: init code reverted")]
    InitReverted,
    #[error("AccountFactory: init code failed: {0}")]
    InitFailed(#[from] RuntimeError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::AlreadyDeployed { .. } => ErrorKind::AlreadyDeployed,
            DeployError::InitReverted | DeployError::InitFailed(_) => ErrorKind::MalformedBytecode,
        }
    }
}
