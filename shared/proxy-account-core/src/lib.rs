//! Shared core for proxy accounts: executor access rules, proxy bytecode, CREATE2 derivation
//! and the account factory.
//!
//! Everything here is `no_std` so the same rules run inside the Stylus controller and in
//! off-chain tooling.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod access;
pub mod bytecode;
pub mod create2;
pub mod decoder;
pub mod errors;
pub mod factory;
pub mod interfaces;
pub mod opcodes;
pub mod runtime;

pub use access::{AccessRegistry, RoleStore};
pub use bytecode::{ProxyBytecode, ProxyLayout};
pub use create2::{AddressDeriver, Create2Deriver};
pub use decoder::DecodedProxy;
pub use errors::{AccessError, DecodeError, DeployError, ErrorKind, RuntimeError};
pub use factory::{AccountFactory, CodeStore, DEFAULT_ACCOUNT_SALT};
pub use opcodes::Opcode;
pub use runtime::{CallOutcome, Halt, Host};
