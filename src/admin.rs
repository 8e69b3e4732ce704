use crate::{
    ledger::AccountId,
    store::SnapshotStore,
};
use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
    },
};
use tracing::warn;

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum AdminSetError {
    #[error("account {0} is not an admin")]
    NotMember(AccountId),

    #[error("cannot remove the last remaining admin")]
    LastAdmin,
}

/// Accounts authorized to credit arbitrary balances. Never empty: the
/// last-member check happens in the same critical section as the
/// removal, so concurrent removals cannot drain the set.
pub struct AdminSet<S> {
    members: Mutex<HashSet<AccountId>>,
    store: Arc<S>,
}

impl<S: SnapshotStore> AdminSet<S> {
    pub fn new(members: HashSet<AccountId>, store: Arc<S>) -> Self {
        debug_assert!(!members.is_empty(), "admin set starts non-empty");
        Self {
            members: Mutex::new(members),
            store,
        }
    }

    pub fn contains(&self, account: AccountId) -> bool {
        self.members.lock().unwrap().contains(&account)
    }

    /// Returns false if the account already was an admin.
    pub fn add(&self, account: AccountId) -> bool {
        let mut members = self.members.lock().unwrap();
        let inserted = members.insert(account);
        if inserted {
            self.checkpoint(&members);
        }
        inserted
    }

    pub fn remove(&self, account: AccountId) -> Result<(), AdminSetError> {
        let mut members = self.members.lock().unwrap();
        if !members.contains(&account) {
            return Err(AdminSetError::NotMember(account));
        }
        if members.len() == 1 {
            return Err(AdminSetError::LastAdmin);
        }
        members.remove(&account);
        self.checkpoint(&members);
        Ok(())
    }

    pub fn list(&self) -> Vec<AccountId> {
        let mut members: Vec<AccountId> =
            self.members.lock().unwrap().iter().copied().collect();
        members.sort_unstable();
        members
    }

    fn checkpoint(&self, members: &HashSet<AccountId>) {
        if let Err(err) = self.store.save_admins(members) {
            warn!(error = %err, "failed to persist admin set, in-memory state stays authoritative");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::store::InMemorySnapshotStore;

    fn admin_set(members: &[AccountId]) -> AdminSet<InMemorySnapshotStore> {
        AdminSet::new(
            members.iter().copied().collect(),
            Arc::new(InMemorySnapshotStore::new()),
        )
    }

    #[test]
    fn remove__rejects_removing_the_last_admin() {
        // given
        let admins = admin_set(&[7]);

        // when
        let result = admins.remove(7);

        // then
        assert_eq!(result.unwrap_err(), AdminSetError::LastAdmin);
        assert!(admins.contains(7));
    }

    #[test]
    fn remove__rejects_non_members() {
        // given
        let admins = admin_set(&[7]);

        // when
        let result = admins.remove(8);

        // then
        assert_eq!(result.unwrap_err(), AdminSetError::NotMember(8));
    }

    #[test]
    fn add_then_remove__keeps_the_set_non_empty() {
        // given
        let admins = admin_set(&[7]);
        assert!(admins.add(8));
        assert!(!admins.add(8));

        // when
        admins.remove(7).unwrap();

        // then
        assert_eq!(admins.list(), vec![8]);
        assert_eq!(admins.remove(8).unwrap_err(), AdminSetError::LastAdmin);
    }

    #[test]
    fn mutations__are_checkpointed() {
        // given
        let store = Arc::new(InMemorySnapshotStore::new());
        let admins = AdminSet::new(HashSet::from([7]), store.clone());

        // when
        admins.add(8);

        // then
        assert_eq!(store.persisted().admins, HashSet::from([7, 8]));
    }
}
