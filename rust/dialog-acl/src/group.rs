//! Groups and the directory that holds them.
//!
//! A [`Group`] is a principal that aggregates other principals. Members may
//! themselves be groups, and nothing prevents a group from (transitively)
//! containing itself. Membership queries therefore walk the membership graph
//! with a visited set, so every query terminates and each group is expanded
//! at most once.
//!
//! Groups are not referenced directly by the ACL. They live in a
//! [`Directory`] keyed by their group [`Principal`], and evaluation goes
//! through the [`Membership`] seam against a [`DirectorySnapshot`].

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{DialogAclError, Principal};

/// Answers transitive group membership questions.
pub trait Membership {
    /// Whether `principal` is a member of `group`, directly or through any
    /// chain of nested groups.
    fn is_member(&self, group: &Principal, principal: &Principal) -> bool;
}

/// A group principal together with its direct members.
///
/// Membership is a reference relation: removing a group never affects the
/// principals it contained, and a principal may belong to many groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    principal: Principal,
    members: BTreeSet<Principal>,
    everyone: bool,
}

impl Group {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            principal: Principal::group(name),
            members: BTreeSet::new(),
            everyone: false,
        }
    }

    /// Create a group of which every principal is a member.
    ///
    /// Its member set cannot be edited.
    pub fn everyone(name: impl Into<String>) -> Self {
        Self {
            everyone: true,
            ..Self::new(name)
        }
    }

    /// The principal naming this group.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Whether this group contains every principal.
    pub fn is_everyone(&self) -> bool {
        self.everyone
    }

    /// Add a direct member. Returns false if it was already a member.
    pub fn add_member(&mut self, member: Principal) -> bool {
        if self.everyone {
            return false;
        }
        self.members.insert(member)
    }

    /// Remove a direct member. Returns false if it was not a member.
    pub fn remove_member(&mut self, member: &Principal) -> bool {
        if self.everyone {
            return false;
        }
        self.members.remove(member)
    }

    /// Direct membership test; nested groups are not expanded.
    pub fn has_member(&self, principal: &Principal) -> bool {
        self.everyone || self.members.contains(principal)
    }

    /// The direct members of this group.
    pub fn members(&self) -> impl Iterator<Item = &Principal> {
        self.members.iter()
    }
}

type Groups = BTreeMap<Principal, Group>;

impl Membership for Groups {
    fn is_member(&self, group: &Principal, principal: &Principal) -> bool {
        let mut visited: HashSet<&Principal> = HashSet::new();
        let mut pending = vec![group];

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                tracing::trace!(group = %current, "Skipping group already expanded");
                continue;
            }

            // A group that is named but not registered has no members
            let Some(record) = self.get(current) else {
                continue;
            };

            if record.has_member(principal) {
                return true;
            }

            pending.extend(record.members().filter(|member| member.is_group()));
        }

        false
    }
}

/// A shared registry of groups.
///
/// Cloning a `Directory` yields another handle onto the same registry. The
/// registry is copy-on-write: a [`DirectorySnapshot`] keeps the version it
/// was taken from, and a later edit copies the groups instead of waiting for
/// outstanding snapshots to be dropped.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    groups: Arc<RwLock<Arc<Groups>>>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty group with the given name, unless one already
    /// exists, and return its principal.
    pub fn create_group(&self, name: impl Into<String>) -> Principal {
        let group = Group::new(name);
        let principal = group.principal().clone();
        let mut guard = self.groups.write();
        let groups = Arc::make_mut(&mut guard);
        if !groups.contains_key(&principal) {
            tracing::debug!(group = %principal, "Created group");
            groups.insert(principal.clone(), group);
        }
        principal
    }

    /// Register a group, replacing any group of the same name.
    pub fn insert(&self, group: Group) -> Option<Group> {
        tracing::debug!(group = %group.principal(), "Registered group");
        let mut guard = self.groups.write();
        Arc::make_mut(&mut guard).insert(group.principal().clone(), group)
    }

    /// Unregister a group. Its members are unaffected.
    pub fn remove_group(&self, group: &Principal) -> Option<Group> {
        let mut guard = self.groups.write();
        let removed = Arc::make_mut(&mut guard).remove(group);
        if removed.is_some() {
            tracing::debug!(group = %group, "Removed group");
        }
        removed
    }

    /// Whether the directory holds the given group.
    pub fn contains(&self, group: &Principal) -> bool {
        self.groups.read().contains_key(group)
    }

    /// A copy of the group registered under `group`.
    pub fn group(&self, group: &Principal) -> Option<Group> {
        self.groups.read().get(group).cloned()
    }

    /// The principals of all registered groups.
    pub fn groups(&self) -> Vec<Principal> {
        self.groups.read().keys().cloned().collect()
    }

    /// Add a direct member to a registered group.
    pub fn add_member(&self, group: &Principal, member: Principal) -> Result<bool, DialogAclError> {
        let mut guard = self.groups.write();
        let record = Arc::make_mut(&mut guard)
            .get_mut(group)
            .ok_or_else(|| DialogAclError::UnknownGroup {
                group: group.clone(),
            })?;
        let added = record.add_member(member.clone());
        if added {
            tracing::debug!(group = %group, member = %member, "Added group member");
        }
        Ok(added)
    }

    /// Remove a direct member from a registered group.
    pub fn remove_member(
        &self,
        group: &Principal,
        member: &Principal,
    ) -> Result<bool, DialogAclError> {
        let mut guard = self.groups.write();
        let record = Arc::make_mut(&mut guard)
            .get_mut(group)
            .ok_or_else(|| DialogAclError::UnknownGroup {
                group: group.clone(),
            })?;
        let removed = record.remove_member(member);
        if removed {
            tracing::debug!(group = %group, member = %member, "Removed group member");
        }
        Ok(removed)
    }

    /// The direct members of a registered group.
    pub fn members(&self, group: &Principal) -> Result<Vec<Principal>, DialogAclError> {
        let groups = self.groups.read();
        let record = groups
            .get(group)
            .ok_or_else(|| DialogAclError::UnknownGroup {
                group: group.clone(),
            })?;
        Ok(record.members().cloned().collect())
    }

    /// Transitive membership test against the current state of the registry.
    pub fn is_member(&self, group: &Principal, principal: &Principal) -> bool {
        self.snapshot().is_member(group, principal)
    }

    /// Capture the registry as it is now.
    ///
    /// The snapshot holds no lock. Membership edges seen through it never
    /// change, so a sequence of queries against it sees one consistent graph
    /// while the directory itself remains free to be read and edited.
    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            groups: Arc::clone(&self.groups.read()),
        }
    }
}

/// An immutable view of a [`Directory`] at one point in time.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    groups: Arc<Groups>,
}

impl DirectorySnapshot {
    /// The groups registered when the snapshot was taken, ordered by
    /// principal.
    pub(crate) fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }
}

impl Membership for DirectorySnapshot {
    fn is_member(&self, group: &Principal, principal: &Principal) -> bool {
        self.groups.is_member(group, principal)
    }
}
