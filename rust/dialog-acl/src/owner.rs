use std::collections::BTreeSet;

use crate::{DialogAclError, Membership, Principal};

/// The set of principals allowed to modify an ACL.
///
/// The registry is seeded with one owner at construction and can never
/// become empty. Every mutation must be made by a caller that is already an
/// owner. A registered owner may be a group, in which case each of its
/// (transitive) members is an owner as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owners {
    owners: BTreeSet<Principal>,
}

impl Owners {
    /// Create a registry holding only `owner`.
    pub fn new(owner: Principal) -> Self {
        Self {
            owners: BTreeSet::from([owner]),
        }
    }

    /// Create a registry from a set of owners, which must not be empty.
    pub fn from_owners(
        owners: impl IntoIterator<Item = Principal>,
    ) -> Result<Self, DialogAclError> {
        let owners: BTreeSet<Principal> = owners.into_iter().collect();
        if owners.is_empty() {
            return Err(DialogAclError::NoOwners);
        }
        Ok(Self { owners })
    }

    /// Whether `principal` holds owner privilege, either as a registered
    /// owner or as a member of a registered owner group.
    pub fn is_owner(&self, principal: &Principal, membership: &impl Membership) -> bool {
        self.owners.contains(principal)
            || self
                .owners
                .iter()
                .filter(|owner| owner.is_group())
                .any(|group| membership.is_member(group, principal))
    }

    /// Fail with [`DialogAclError::NotOwner`] unless `caller` is an owner.
    pub fn authorize(
        &self,
        caller: &Principal,
        membership: &impl Membership,
    ) -> Result<(), DialogAclError> {
        if self.is_owner(caller, membership) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "Rejected mutation from non-owner");
            Err(DialogAclError::NotOwner {
                principal: caller.clone(),
            })
        }
    }

    /// Register `owner`. Returns false if it was already registered.
    pub fn add_owner(
        &mut self,
        caller: &Principal,
        owner: Principal,
        membership: &impl Membership,
    ) -> Result<bool, DialogAclError> {
        self.authorize(caller, membership)?;
        if self.owners.contains(&owner) {
            return Ok(false);
        }
        tracing::debug!(caller = %caller, owner = %owner, "Added owner");
        self.owners.insert(owner);
        Ok(true)
    }

    /// Unregister `owner`. Returns false if it was not registered.
    ///
    /// Fails with [`DialogAclError::LastOwner`] rather than removing the only
    /// remaining owner.
    pub fn delete_owner(
        &mut self,
        caller: &Principal,
        owner: &Principal,
        membership: &impl Membership,
    ) -> Result<bool, DialogAclError> {
        self.authorize(caller, membership)?;
        if !self.owners.contains(owner) {
            return Ok(false);
        }
        if self.owners.len() == 1 {
            tracing::warn!(caller = %caller, owner = %owner, "Refused to remove the last owner");
            return Err(DialogAclError::LastOwner {
                principal: owner.clone(),
            });
        }
        tracing::debug!(caller = %caller, owner = %owner, "Removed owner");
        self.owners.remove(owner);
        Ok(true)
    }

    /// The registered owners in order.
    pub fn owners(&self) -> impl Iterator<Item = &Principal> {
        self.owners.iter()
    }

    /// The number of registered owners. Never zero.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Always false for a registry built through [`Owners::new`] or
    /// [`Owners::from_owners`].
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
