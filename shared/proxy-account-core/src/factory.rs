//! Deterministic proxy account factory.

use alloc::vec::Vec;

use alloy_primitives::{b256, Address, B256};

use crate::{
    bytecode::ProxyBytecode,
    create2::{AddressDeriver, Create2Deriver},
    errors::DeployError,
    runtime::{run_init_code, Halt},
};

/// Salt used by `deploy_account` when the caller does not pick one.
pub const DEFAULT_ACCOUNT_SALT: B256 =
    b256!("841eb53dae7d7c32f92a7e2a07956fb3b9b1532166bc47aa8f091f49bcaa9ff5");

/// Deployed-address space the factory writes into.
pub trait CodeStore {
    fn code_at(&self, address: Address) -> Option<&[u8]>;

    fn install_code(&mut self, address: Address, code: Vec<u8>);
}

/// Deploys proxy accounts for a single implementation from a single deployer address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountFactory<D = Create2Deriver> {
    address: Address,
    implementation: Address,
    salt: B256,
    deriver: D,
}

impl AccountFactory<Create2Deriver> {
    pub fn new(address: Address, implementation: Address) -> Self {
        Self::with_deriver(address, implementation, Create2Deriver)
    }
}

impl<D: AddressDeriver> AccountFactory<D> {
    pub fn with_deriver(address: Address, implementation: Address, deriver: D) -> Self {
        Self {
            address,
            implementation,
            salt: DEFAULT_ACCOUNT_SALT,
            deriver,
        }
    }

    /// Replace the default salt.
    pub fn with_salt(mut self, salt: B256) -> Self {
        self.salt = salt;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn implementation(&self) -> Address {
        self.implementation
    }

    pub fn salt(&self) -> B256 {
        self.salt
    }

    pub fn account_bytecode(&self, owner: Address) -> ProxyBytecode {
        ProxyBytecode::assemble(self.implementation, owner)
    }

    pub fn predict_account_address(&self, owner: Address) -> Address {
        self.predict_account_address_with_salt(owner, self.salt)
    }

    pub fn predict_account_address_with_salt(&self, owner: Address, salt: B256) -> Address {
        let code = self.account_bytecode(owner);
        self.deriver.derive_address(self.address, salt, code.as_bytes())
    }

    /// Deploy the account of `owner` under the factory salt.
    pub fn deploy_account<S: CodeStore + ?Sized>(
        &self,
        store: &mut S,
        owner: Address,
    ) -> Result<Address, DeployError> {
        self.deploy_account_with_salt(store, owner, self.salt)
    }

    /// Deploy the account of `owner` under `salt`. At most once per (owner, salt): a second
    /// attempt finds code at the derived address and fails with `AlreadyDeployed`.
    pub fn deploy_account_with_salt<S: CodeStore + ?Sized>(
        &self,
        store: &mut S,
        owner: Address,
        salt: B256,
    ) -> Result<Address, DeployError> {
        let code = self.account_bytecode(owner);
        let address = self.deriver.derive_address(self.address, salt, code.as_bytes());

        if store.code_at(address).is_some_and(|existing| !existing.is_empty()) {
            return Err(DeployError::AlreadyDeployed { address });
        }

        let runtime = match run_init_code(code.as_bytes())? {
            Halt::Return(runtime) => runtime,
            Halt::Stop => Vec::new(),
            Halt::Revert(_) => return Err(DeployError::InitReverted),
        };
        store.install_code(address, runtime);
        Ok(address)
    }
}
