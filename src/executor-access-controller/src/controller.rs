//! Stylus executor access controller.
//!
//! Off-proxy infrastructure consults this contract to decide who may trigger execution through
//! deployed proxy accounts. The transition rules live in `proxy_account_core::access`; this
//! contract only maps them onto storage and reverts with `Error(string)` on rejection.

use alloc::{vec, vec::Vec};

use stylus_sdk::{alloy_primitives::Address, prelude::*};

use proxy_account_core::{
    access::{self, RoleStore},
    errors::{revert_data, AccessError},
};

sol_storage! {
    #[entrypoint]
    pub struct ExecutorAccessController {
        /// Set once by the constructor.
        address owner;

        mapping(address => bool) admins;

        /// executor → admin that added it; zero when not registered.
        mapping(address => address) executor_adders;
    }
}

#[public]
impl ExecutorAccessController {
    #[constructor]
    pub fn constructor(&mut self, owner: Address) {
        self.owner.set(owner);
    }

    pub fn add_admin(&mut self, admin: Address) -> Result<(), Vec<u8>> {
        let caller = self.vm().msg_sender();
        access::add_admin(self, caller, admin).map_err(revert)
    }

    pub fn remove_admin(&mut self, admin: Address) -> Result<(), Vec<u8>> {
        let caller = self.vm().msg_sender();
        access::remove_admin(self, caller, admin).map_err(revert)
    }

    pub fn add_executor(&mut self, executor: Address) -> Result<(), Vec<u8>> {
        let caller = self.vm().msg_sender();
        access::add_executor(self, caller, executor).map_err(revert)
    }

    pub fn remove_executor(&mut self, executor: Address) -> Result<(), Vec<u8>> {
        let caller = self.vm().msg_sender();
        access::remove_executor(self, caller, executor).map_err(revert)
    }

    pub fn is_owner(&self, account: Address) -> bool {
        access::is_owner(self, account)
    }

    pub fn is_admin(&self, account: Address) -> bool {
        access::is_admin(self, account)
    }

    pub fn is_executor(&self, account: Address) -> bool {
        access::is_executor(self, account)
    }

    /// Zero address when `executor` is not registered.
    pub fn adder_of(&self, executor: Address) -> Address {
        access::adder_of(self, executor).unwrap_or(Address::ZERO)
    }
}

impl RoleStore for ExecutorAccessController {
    fn stored_owner(&self) -> Address {
        self.owner.get()
    }

    fn stored_admin(&self, account: Address) -> bool {
        self.admins.get(account)
    }

    fn store_admin(&mut self, account: Address, enabled: bool) {
        self.admins.insert(account, enabled);
    }

    fn stored_adder(&self, executor: Address) -> Option<Address> {
        let adder = self.executor_adders.get(executor);
        (adder != Address::ZERO).then_some(adder)
    }

    fn store_adder(&mut self, executor: Address, adder: Option<Address>) {
        self.executor_adders.insert(executor, adder.unwrap_or(Address::ZERO));
    }
}

fn revert(err: AccessError) -> Vec<u8> {
    revert_data(&err)
}
