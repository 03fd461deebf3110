//! Owner → admin → executor access rules.
//!
//! The rules are written once against [`RoleStore`] so the Stylus controller (contract storage)
//! and [`AccessRegistry`] (in memory) enforce exactly the same transitions. Every rule checks
//! before it writes, so a rejected call never leaves a partial mutation behind.

use alloc::collections::{BTreeMap, BTreeSet};

use alloy_primitives::Address;

use crate::errors::AccessError;

/// Raw role state. Implementors only persist values; authorisation lives in the free functions
/// of this module.
pub trait RoleStore {
    fn stored_owner(&self) -> Address;

    fn stored_admin(&self, account: Address) -> bool;

    fn store_admin(&mut self, account: Address, enabled: bool);

    /// Admin that registered `executor`, if it is currently registered.
    fn stored_adder(&self, executor: Address) -> Option<Address>;

    fn store_adder(&mut self, executor: Address, adder: Option<Address>);
}

pub fn is_owner<S: RoleStore + ?Sized>(store: &S, account: Address) -> bool {
    store.stored_owner() == account
}

pub fn is_admin<S: RoleStore + ?Sized>(store: &S, account: Address) -> bool {
    store.stored_admin(account)
}

pub fn is_executor<S: RoleStore + ?Sized>(store: &S, account: Address) -> bool {
    store.stored_adder(account).is_some()
}

pub fn adder_of<S: RoleStore + ?Sized>(store: &S, executor: Address) -> Option<Address> {
    store.stored_adder(executor)
}

/// Owner-only. Adding an existing admin is a no-op.
pub fn add_admin<S: RoleStore + ?Sized>(
    store: &mut S,
    caller: Address,
    admin: Address,
) -> Result<(), AccessError> {
    only_owner(store, caller)?;
    store.store_admin(admin, true);
    Ok(())
}

/// Owner-only. Executors added by `admin` stay registered under their stale adder.
pub fn remove_admin<S: RoleStore + ?Sized>(
    store: &mut S,
    caller: Address,
    admin: Address,
) -> Result<(), AccessError> {
    only_owner(store, caller)?;
    store.store_admin(admin, false);
    Ok(())
}

/// Admin-only. An executor that already has an adder cannot be claimed again, not even by the
/// same admin.
pub fn add_executor<S: RoleStore + ?Sized>(
    store: &mut S,
    caller: Address,
    executor: Address,
) -> Result<(), AccessError> {
    if !store.stored_admin(caller) {
        return Err(AccessError::NotAdmin);
    }
    if store.stored_adder(executor).is_some() {
        return Err(AccessError::AlreadyClaimed);
    }
    store.store_adder(executor, Some(caller));
    Ok(())
}

/// Owner or the recorded adder. Admin status of the adder is not re-checked.
///
/// Removing an executor that is not registered succeeds as a no-op for the owner and is
/// rejected with [`AccessError::NotAdder`] for everyone else.
pub fn remove_executor<S: RoleStore + ?Sized>(
    store: &mut S,
    caller: Address,
    executor: Address,
) -> Result<(), AccessError> {
    let adder = store.stored_adder(executor);
    if caller != store.stored_owner() && adder != Some(caller) {
        return Err(AccessError::NotAdder);
    }
    store.store_adder(executor, None);
    Ok(())
}

fn only_owner<S: RoleStore + ?Sized>(store: &S, caller: Address) -> Result<(), AccessError> {
    if caller != store.stored_owner() {
        return Err(AccessError::NotOwner);
    }
    Ok(())
}

/// In-memory executor access registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessRegistry {
    owner: Address,
    admins: BTreeSet<Address>,
    /// executor → adder
    executors: BTreeMap<Address, Address>,
}

impl AccessRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            admins: BTreeSet::new(),
            executors: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn add_admin(&mut self, caller: Address, admin: Address) -> Result<(), AccessError> {
        add_admin(self, caller, admin)
    }

    pub fn remove_admin(&mut self, caller: Address, admin: Address) -> Result<(), AccessError> {
        remove_admin(self, caller, admin)
    }

    pub fn add_executor(&mut self, caller: Address, executor: Address) -> Result<(), AccessError> {
        add_executor(self, caller, executor)
    }

    pub fn remove_executor(
        &mut self,
        caller: Address,
        executor: Address,
    ) -> Result<(), AccessError> {
        remove_executor(self, caller, executor)
    }

    pub fn is_owner(&self, account: Address) -> bool {
        is_owner(self, account)
    }

    pub fn is_admin(&self, account: Address) -> bool {
        is_admin(self, account)
    }

    pub fn is_executor(&self, account: Address) -> bool {
        is_executor(self, account)
    }

    pub fn adder_of(&self, executor: Address) -> Option<Address> {
        adder_of(self, executor)
    }

    pub fn admins(&self) -> impl Iterator<Item = Address> + '_ {
        self.admins.iter().copied()
    }

    /// Registered executors with their adders.
    pub fn executors(&self) -> impl Iterator<Item = (Address, Address)> + '_ {
        self.executors.iter().map(|(executor, adder)| (*executor, *adder))
    }
}

impl RoleStore for AccessRegistry {
    fn stored_owner(&self) -> Address {
        self.owner
    }

    fn stored_admin(&self, account: Address) -> bool {
        self.admins.contains(&account)
    }

    fn store_admin(&mut self, account: Address, enabled: bool) {
        if enabled {
            self.admins.insert(account);
        } else {
            self.admins.remove(&account);
        }
    }

    fn stored_adder(&self, executor: Address) -> Option<Address> {
        self.executors.get(&executor).copied()
    }

    fn store_adder(&mut self, executor: Address, adder: Option<Address>) {
        match adder {
            Some(adder) => {
                self.executors.insert(executor, adder);
            }
            None => {
                self.executors.remove(&executor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use alloy_primitives::address;

    const OWNER: Address = address!("1000000000000000000000000000000000000001");
    const ADMIN: Address = address!("2000000000000000000000000000000000000002");
    const ADMIN2: Address = address!("2000000000000000000000000000000000000003");
    const EXECUTOR: Address = address!("3000000000000000000000000000000000000004");
    const EXECUTOR2: Address = address!("3000000000000000000000000000000000000005");
    const RANDOM: Address = address!("4000000000000000000000000000000000000006");

    fn with_admins() -> AccessRegistry {
        let mut registry = AccessRegistry::new(OWNER);
        registry.add_admin(OWNER, ADMIN).unwrap();
        registry.add_admin(OWNER, ADMIN2).unwrap();
        registry
    }

    #[test]
    fn owner_is_fixed_at_construction() {
        let registry = AccessRegistry::new(OWNER);
        assert!(registry.is_owner(OWNER));
        for other in [ADMIN, EXECUTOR, RANDOM, Address::ZERO] {
            assert!(!registry.is_owner(other));
        }
    }

    #[test]
    fn owner_adds_and_removes_admins() {
        let mut registry = AccessRegistry::new(OWNER);
        registry.add_admin(OWNER, ADMIN).unwrap();
        assert!(registry.is_admin(ADMIN));
        registry.add_admin(OWNER, ADMIN).unwrap();
        assert_eq!(registry.admins().count(), 1);
        registry.remove_admin(OWNER, ADMIN).unwrap();
        assert!(!registry.is_admin(ADMIN));
    }

    #[test]
    fn non_owner_cannot_manage_admins() {
        let mut registry = with_admins();
        let before = registry.clone();
        assert_eq!(registry.add_admin(ADMIN, RANDOM), Err(AccessError::NotOwner));
        assert_eq!(registry.add_admin(RANDOM, RANDOM), Err(AccessError::NotOwner));
        assert_eq!(registry.remove_admin(RANDOM, ADMIN), Err(AccessError::NotOwner));
        assert_eq!(registry.remove_admin(ADMIN2, ADMIN), Err(AccessError::NotOwner));
        assert_eq!(registry, before);
        assert_eq!(AccessError::NotOwner.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn owner_is_not_implicitly_an_admin() {
        let mut registry = AccessRegistry::new(OWNER);
        assert_eq!(registry.add_executor(OWNER, EXECUTOR), Err(AccessError::NotAdmin));
        assert!(!registry.is_executor(EXECUTOR));
    }

    #[test]
    fn admin_adds_and_removes_own_executor() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        assert!(registry.is_executor(EXECUTOR));
        assert_eq!(registry.adder_of(EXECUTOR), Some(ADMIN));
        registry.remove_executor(ADMIN, EXECUTOR).unwrap();
        assert!(!registry.is_executor(EXECUTOR));
        assert_eq!(registry.adder_of(EXECUTOR), None);
    }

    #[test]
    fn owner_removes_any_executor() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        registry.remove_executor(OWNER, EXECUTOR).unwrap();
        assert!(!registry.is_executor(EXECUTOR));
    }

    #[test]
    fn other_admin_cannot_remove_or_reclaim() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN2, EXECUTOR2).unwrap();
        assert_eq!(
            registry.remove_executor(ADMIN, EXECUTOR2),
            Err(AccessError::NotAdder)
        );
        assert_eq!(
            registry.add_executor(ADMIN, EXECUTOR2),
            Err(AccessError::AlreadyClaimed)
        );
        assert!(registry.is_executor(EXECUTOR2));
        assert_eq!(registry.adder_of(EXECUTOR2), Some(ADMIN2));
    }

    #[test]
    fn adder_cannot_reclaim_its_own_executor() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        assert_eq!(
            registry.add_executor(ADMIN, EXECUTOR),
            Err(AccessError::AlreadyClaimed)
        );
    }

    #[test]
    fn random_account_is_rejected_everywhere() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        let before = registry.clone();
        assert_eq!(registry.add_admin(RANDOM, ADMIN2), Err(AccessError::NotOwner));
        assert_eq!(registry.add_executor(RANDOM, EXECUTOR2), Err(AccessError::NotAdmin));
        assert_eq!(registry.remove_admin(RANDOM, ADMIN), Err(AccessError::NotOwner));
        assert_eq!(registry.remove_executor(RANDOM, EXECUTOR), Err(AccessError::NotAdder));
        assert_eq!(registry, before);
    }

    #[test]
    fn removal_retry_after_owner_removal() {
        let mut registry = AccessRegistry::new(OWNER);
        registry.add_admin(OWNER, ADMIN).unwrap();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        registry.remove_executor(OWNER, EXECUTOR).unwrap();
        // The adder link is gone, so the former adder is just another caller.
        assert_eq!(registry.remove_executor(ADMIN, EXECUTOR), Err(AccessError::NotAdder));
        // The owner's retry is a no-op.
        registry.remove_executor(OWNER, EXECUTOR).unwrap();
        assert!(!registry.is_executor(EXECUTOR));
    }

    #[test]
    fn removing_admin_does_not_cascade() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        registry.remove_admin(OWNER, ADMIN).unwrap();
        assert!(registry.is_executor(EXECUTOR));
        assert_eq!(registry.adder_of(EXECUTOR), Some(ADMIN));
        // A removed admin can no longer add executors.
        assert_eq!(registry.add_executor(ADMIN, EXECUTOR2), Err(AccessError::NotAdmin));
        // Nobody else can claim the stale executor.
        assert_eq!(
            registry.add_executor(ADMIN2, EXECUTOR),
            Err(AccessError::AlreadyClaimed)
        );
        // The recorded adder keeps its removal right.
        registry.remove_executor(ADMIN, EXECUTOR).unwrap();
        assert!(!registry.is_executor(EXECUTOR));
    }

    #[test]
    fn executor_can_be_reregistered_after_removal() {
        let mut registry = with_admins();
        registry.add_executor(ADMIN, EXECUTOR).unwrap();
        registry.remove_executor(ADMIN, EXECUTOR).unwrap();
        registry.add_executor(ADMIN2, EXECUTOR).unwrap();
        assert_eq!(registry.adder_of(EXECUTOR), Some(ADMIN2));
        assert_eq!(registry.executors().collect::<Vec<_>>(), vec![(EXECUTOR, ADMIN2)]);
    }
}
