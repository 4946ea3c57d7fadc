//! The access control list and its permission resolution.
//!
//! Effective permissions for a principal combine the entries naming it
//! directly with the entries of every group it (transitively) belongs to:
//!
//! ```text
//! group     = group positive - group negative
//! effective = (group - individual negative) + individual positive
//! ```
//!
//! So an individual positive entry always wins, an individual negative entry
//! strips what groups grant, and a permission that one group grants while
//! another denies is not granted at all.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use parking_lot::RwLock;

use crate::{
    AclEntry, DialogAclError, Directory, Membership, Owners, Permission, Principal, Sign,
};

type EntryKey = (Principal, Sign);

#[derive(Debug)]
struct AclState {
    name: String,
    owners: Owners,
    entries: BTreeMap<EntryKey, AclEntry>,
}

impl AclState {
    fn entry(&self, principal: &Principal, sign: Sign) -> Option<&AclEntry> {
        self.entries.get(&(principal.clone(), sign))
    }

    /// Entries held by groups other than `principal` itself that contain it.
    fn group_entries<'a>(
        &'a self,
        principal: &'a Principal,
        membership: &'a impl Membership,
    ) -> impl Iterator<Item = &'a AclEntry> {
        self.entries
            .iter()
            .filter(move |((holder, _), _)| {
                holder.is_group() && holder != principal && membership.is_member(holder, principal)
            })
            .map(|(_, entry)| entry)
    }
}

/// An access control list.
///
/// Holds at most one positive and one negative [`AclEntry`] per principal,
/// plus the [`Owners`] allowed to modify it. The entries and owners share a
/// single read-write lock, so concurrent permission checks proceed in
/// parallel while any modification is exclusive. Group membership is
/// resolved against the [`Directory`] the ACL was created with, and each
/// query reads one consistent snapshot of it.
#[derive(Debug)]
pub struct Acl {
    directory: Directory,
    state: RwLock<AclState>,
}

impl Acl {
    /// Create an ACL with a single initial owner and no entries.
    pub fn new(name: impl Into<String>, owner: Principal, directory: Directory) -> Self {
        Self::from_parts(name.into(), Owners::new(owner), BTreeMap::new(), directory)
    }

    pub(crate) fn from_parts(
        name: String,
        owners: Owners,
        entries: BTreeMap<EntryKey, AclEntry>,
        directory: Directory,
    ) -> Self {
        Self {
            directory,
            state: RwLock::new(AclState {
                name,
                owners,
                entries,
            }),
        }
    }

    /// The directory used to resolve group membership.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// The display name of this ACL.
    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    /// Rename this ACL.
    pub fn set_name(&self, caller: &Principal, name: impl Into<String>) -> Result<(), DialogAclError> {
        let mut state = self.state.write();
        state.owners.authorize(caller, &self.directory.snapshot())?;
        let name = name.into();
        tracing::debug!(caller = %caller, from = %state.name, to = %name, "Renamed ACL");
        state.name = name;
        Ok(())
    }

    /// Whether `principal` may modify this ACL.
    pub fn is_owner(&self, principal: &Principal) -> bool {
        let state = self.state.read();
        state.owners.is_owner(principal, &self.directory.snapshot())
    }

    /// Register another owner. See [`Owners::add_owner`].
    pub fn add_owner(&self, caller: &Principal, owner: Principal) -> Result<bool, DialogAclError> {
        let mut state = self.state.write();
        state
            .owners
            .add_owner(caller, owner, &self.directory.snapshot())
    }

    /// Unregister an owner. See [`Owners::delete_owner`].
    pub fn delete_owner(
        &self,
        caller: &Principal,
        owner: &Principal,
    ) -> Result<bool, DialogAclError> {
        let mut state = self.state.write();
        state
            .owners
            .delete_owner(caller, owner, &self.directory.snapshot())
    }

    /// The registered owners.
    pub fn owners(&self) -> Vec<Principal> {
        self.state.read().owners.owners().cloned().collect()
    }

    /// Add an entry.
    ///
    /// Returns false, leaving the existing entry untouched, if an entry with
    /// the same principal and sign is already present.
    pub fn add_entry(&self, caller: &Principal, entry: AclEntry) -> Result<bool, DialogAclError> {
        let mut state = self.state.write();
        state.owners.authorize(caller, &self.directory.snapshot())?;

        let principal = entry.principal().ok_or(DialogAclError::UnboundEntry)?.clone();
        let key = (principal, entry.sign());
        if state.entries.contains_key(&key) {
            return Ok(false);
        }

        tracing::debug!(acl = %state.name, caller = %caller, entry = %entry, "Added entry");
        state.entries.insert(key, entry);
        Ok(true)
    }

    /// Remove the entry with the same principal and sign as `entry`.
    ///
    /// Returns false if there is no such entry.
    pub fn remove_entry(
        &self,
        caller: &Principal,
        entry: &AclEntry,
    ) -> Result<bool, DialogAclError> {
        let mut state = self.state.write();
        state.owners.authorize(caller, &self.directory.snapshot())?;

        let Some(principal) = entry.principal() else {
            return Ok(false);
        };

        match state.entries.remove(&(principal.clone(), entry.sign())) {
            Some(removed) => {
                tracing::debug!(acl = %state.name, caller = %caller, entry = %removed, "Removed entry");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// A snapshot of the current entries, ordered by principal then sign.
    ///
    /// The returned iterator owns its entries and can be cloned to restart
    /// the enumeration; later changes to the ACL are not reflected in it.
    pub fn entries(&self) -> std::vec::IntoIter<AclEntry> {
        let entries: Vec<AclEntry> = self.state.read().entries.values().cloned().collect();
        entries.into_iter()
    }

    /// The effective permissions of `principal`.
    pub fn permissions(&self, principal: &Principal) -> BTreeSet<Permission> {
        let state = self.state.read();
        let directory = self.directory.snapshot();

        let mut granted = BTreeSet::new();
        let mut denied = BTreeSet::new();
        for entry in state.group_entries(principal, &directory) {
            match entry.sign() {
                Sign::Positive => granted.extend(entry.permissions().cloned()),
                Sign::Negative => denied.extend(entry.permissions().cloned()),
            }
        }

        if let Some(entry) = state.entry(principal, Sign::Negative) {
            denied.extend(entry.permissions().cloned());
        }

        let mut effective: BTreeSet<Permission> = granted.difference(&denied).cloned().collect();

        if let Some(entry) = state.entry(principal, Sign::Positive) {
            effective.extend(entry.permissions().cloned());
        }

        effective
    }

    /// Whether `principal` effectively holds `permission`.
    ///
    /// Agrees with [`Acl::permissions`] without building the full set.
    pub fn check_permission(&self, principal: &Principal, permission: &Permission) -> bool {
        let state = self.state.read();

        if let Some(entry) = state.entry(principal, Sign::Positive) {
            if entry.check_permission(permission) {
                return true;
            }
        }

        if let Some(entry) = state.entry(principal, Sign::Negative) {
            if entry.check_permission(permission) {
                return false;
            }
        }

        let directory = self.directory.snapshot();
        let mut granted = false;
        for entry in state.group_entries(principal, &directory) {
            if !entry.check_permission(permission) {
                continue;
            }
            match entry.sign() {
                Sign::Negative => return false,
                Sign::Positive => granted = true,
            }
        }

        granted
    }

    pub(crate) fn with_state<T>(
        &self,
        read: impl FnOnce(&str, &Owners, &BTreeMap<EntryKey, AclEntry>) -> T,
    ) -> T {
        let state = self.state.read();
        read(&state.name, &state.owners, &state.entries)
    }
}

impl Display for Acl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        for entry in state.entries.values() {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn permissions(names: &[&str]) -> BTreeSet<Permission> {
        names.iter().copied().map(Permission::from).collect()
    }

    fn acl() -> (Acl, Principal) {
        let owner = Principal::user("owner");
        (Acl::new("test", owner.clone(), Directory::new()), owner)
    }

    #[test]
    fn it_grants_individual_positive_permissions() -> TestResult {
        let (acl, owner) = acl();
        let alice = Principal::user("alice");

        assert!(acl.add_entry(&owner, AclEntry::positive(alice.clone()).with_permission("read"))?);
        assert_eq!(acl.permissions(&alice), permissions(&["read"]));
        assert!(acl.check_permission(&alice, &"read".into()));
        assert!(!acl.check_permission(&alice, &"write".into()));
        Ok(())
    }

    #[test]
    fn it_lets_individual_positive_win_over_individual_negative() -> TestResult {
        let (acl, owner) = acl();
        let alice = Principal::user("alice");

        acl.add_entry(&owner, AclEntry::positive(alice.clone()).with_permission("read"))?;
        assert!(acl.add_entry(&owner, AclEntry::negative(alice.clone()).with_permission("read"))?);

        assert_eq!(acl.permissions(&alice), permissions(&["read"]));
        assert!(acl.check_permission(&alice, &"read".into()));
        Ok(())
    }

    #[test]
    fn it_rejects_a_second_entry_with_the_same_sign() -> TestResult {
        let (acl, owner) = acl();
        let alice = Principal::user("alice");

        acl.add_entry(&owner, AclEntry::positive(alice.clone()).with_permission("read"))?;
        assert!(!acl.add_entry(&owner, AclEntry::positive(alice.clone()).with_permission("write"))?);
        assert_eq!(acl.permissions(&alice), permissions(&["read"]));
        Ok(())
    }

    #[test]
    fn it_requires_ownership_for_every_mutation() {
        let (acl, _) = acl();
        let mallory = Principal::user("mallory");
        let not_owner = Err(DialogAclError::NotOwner {
            principal: mallory.clone(),
        });
        let entry = AclEntry::positive(mallory.clone()).with_permission("admin");

        assert_eq!(acl.add_entry(&mallory, entry.clone()), not_owner);
        assert_eq!(acl.remove_entry(&mallory, &entry), not_owner);
        assert_eq!(acl.add_owner(&mallory, mallory.clone()), not_owner);
        assert_eq!(acl.delete_owner(&mallory, &mallory), not_owner);
        assert_eq!(
            acl.set_name(&mallory, "mine"),
            Err(DialogAclError::NotOwner {
                principal: mallory.clone(),
            })
        );
        assert_eq!(acl.name(), "test");
        assert_eq!(acl.entries().count(), 0);
    }

    #[test]
    fn it_rejects_entries_without_a_principal() {
        let (acl, owner) = acl();

        assert_eq!(
            acl.add_entry(&owner, AclEntry::new().with_permission("read")),
            Err(DialogAclError::UnboundEntry)
        );
    }

    #[test]
    fn it_removes_entries_by_principal_and_sign() -> TestResult {
        let (acl, owner) = acl();
        let alice = Principal::user("alice");

        acl.add_entry(&owner, AclEntry::positive(alice.clone()).with_permission("read"))?;
        acl.add_entry(&owner, AclEntry::negative(alice.clone()).with_permission("write"))?;

        assert!(acl.remove_entry(&owner, &AclEntry::positive(alice.clone()))?);
        assert!(!acl.remove_entry(&owner, &AclEntry::positive(alice.clone()))?);
        assert!(!acl.remove_entry(&owner, &AclEntry::new())?);

        let remaining: Vec<AclEntry> = acl.entries().collect();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_negative());
        Ok(())
    }

    #[test]
    fn it_enumerates_a_restartable_snapshot() -> TestResult {
        let (acl, owner) = acl();
        let alice = Principal::user("alice");
        let bob = Principal::user("bob");

        acl.add_entry(&owner, AclEntry::positive(bob.clone()))?;
        acl.add_entry(&owner, AclEntry::positive(alice.clone()))?;

        let entries = acl.entries();
        acl.remove_entry(&owner, &AclEntry::positive(bob.clone()))?;

        let first: Vec<_> = entries.clone().filter_map(|e| e.principal().cloned()).collect();
        let second: Vec<_> = entries.filter_map(|e| e.principal().cloned()).collect();
        assert_eq!(first, vec![alice.clone(), bob.clone()]);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn it_renames_for_owners() -> TestResult {
        let (acl, owner) = acl();

        acl.set_name(&owner, "renamed")?;
        assert_eq!(acl.name(), "renamed");
        Ok(())
    }

    #[test]
    fn it_renders_one_entry_per_line() -> TestResult {
        let (acl, owner) = acl();
        acl.add_entry(
            &owner,
            AclEntry::positive(Principal::user("alice")).with_permission("read"),
        )?;
        acl.add_entry(
            &owner,
            AclEntry::negative(Principal::group("eng")).with_permission("write"),
        )?;

        assert_eq!(acl.to_string(), "+User.alice=read\n-Group.eng=write\n");
        Ok(())
    }
}
