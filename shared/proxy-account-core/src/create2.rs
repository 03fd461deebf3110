//! Deterministic deployment addresses.

use alloy_primitives::{keccak256, Address, B256};

/// Tag byte prefixed to the CREATE2 preimage (EIP-1014).
pub const CREATE2_PREFIX: u8 = 0xff;

/// Address derivation used by the factory. Implemented differently per execution environment.
pub trait AddressDeriver {
    fn derive_address(&self, deployer: Address, salt: B256, deploy_code: &[u8]) -> Address;
}

/// `keccak256(0xff ‖ deployer ‖ salt ‖ keccak256(deploy_code))[12..]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Create2Deriver;

impl AddressDeriver for Create2Deriver {
    fn derive_address(&self, deployer: Address, salt: B256, deploy_code: &[u8]) -> Address {
        create2_address(deployer, salt, keccak256(deploy_code))
    }
}

/// CREATE2 address from an already-hashed deployment code.
pub fn create2_address(deployer: Address, salt: B256, code_hash: B256) -> Address {
    let mut preimage = [0u8; 1 + 20 + 32 + 32];
    preimage[0] = CREATE2_PREFIX;
    preimage[1..21].copy_from_slice(deployer.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..85].copy_from_slice(code_hash.as_slice());
    let digest = keccak256(preimage);
    Address::from_slice(&digest[12..32])
}
