use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Permission, Principal};

/// Whether an entry grants or denies its permissions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    /// The entry grants its permissions.
    #[default]
    Positive,
    /// The entry denies its permissions.
    Negative,
}

impl Display for Sign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Sign::Positive => f.write_str("positive"),
            Sign::Negative => f.write_str("negative"),
        }
    }
}

/// Binds one principal to a set of permissions that are either granted or
/// denied.
///
/// An entry starts out positive with no principal. The principal can be bound
/// once, and the sign can only ever move from positive to negative. Cloning
/// an entry gives an independent permission set for the same principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclEntry {
    principal: Option<Principal>,
    sign: Sign,
    permissions: BTreeSet<Permission>,
}

impl AclEntry {
    /// Create an unbound, positive entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a positive entry for `principal`.
    pub fn positive(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..Self::default()
        }
    }

    /// Create a negative entry for `principal`.
    pub fn negative(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            sign: Sign::Negative,
            ..Self::default()
        }
    }

    /// Add `permission` and return the entry, for building entries inline.
    pub fn with_permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Bind the principal. Returns false, leaving the entry unchanged, if a
    /// principal is already bound.
    pub fn set_principal(&mut self, principal: Principal) -> bool {
        if self.principal.is_some() {
            return false;
        }
        self.principal = Some(principal);
        true
    }

    /// The bound principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Turn this entry into a negative one. There is no way back.
    pub fn set_negative_permissions(&mut self) {
        self.sign = Sign::Negative;
    }

    /// The sign of this entry.
    pub fn sign(&self) -> Sign {
        self.sign
    }

    /// Whether this entry denies its permissions.
    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }

    /// Returns false if the permission was already present.
    pub fn add_permission(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// Returns false if the permission was absent.
    pub fn remove_permission(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// Whether this entry lists `permission`, regardless of its sign.
    pub fn check_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// The permissions of this entry in order.
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }
}

impl Display for AclEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_negative() { '-' } else { '+' };
        match &self.principal {
            Some(principal) if principal.is_group() => write!(f, "{sign}Group.{principal}=")?,
            Some(principal) => write!(f, "{sign}User.{principal}=")?,
            None => write!(f, "{sign}<unbound>=")?,
        }

        for (index, permission) in self.permissions.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{permission}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_binds_the_principal_once() {
        let mut entry = AclEntry::new();

        assert!(entry.principal().is_none());
        assert!(entry.set_principal(Principal::user("alice")));
        assert!(!entry.set_principal(Principal::user("bob")));
        assert_eq!(entry.principal(), Some(&Principal::user("alice")));
    }

    #[test]
    fn it_only_moves_from_positive_to_negative() {
        let mut entry = AclEntry::positive(Principal::user("alice"));

        assert_eq!(entry.sign(), Sign::Positive);
        entry.set_negative_permissions();
        assert!(entry.is_negative());
        entry.set_negative_permissions();
        assert_eq!(entry.sign(), Sign::Negative);
    }

    #[test]
    fn it_keeps_permissions_as_a_set() {
        let mut entry = AclEntry::positive(Principal::user("alice"));
        let read = Permission::from("read");

        assert!(entry.add_permission(read.clone()));
        assert!(!entry.add_permission(read.clone()));
        assert!(entry.check_permission(&read));
        assert!(entry.remove_permission(&read));
        assert!(!entry.remove_permission(&read));
        assert!(!entry.check_permission(&read));
    }

    #[test]
    fn it_clones_into_an_independent_permission_set() {
        let original = AclEntry::positive(Principal::user("alice")).with_permission("read");
        let mut copy = original.clone();

        copy.add_permission("write".into());

        assert_eq!(copy.principal(), original.principal());
        assert!(!original.check_permission(&"write".into()));
        assert!(copy.check_permission(&"write".into()));
    }

    #[test]
    fn it_renders_sign_kind_and_permissions() {
        let entry = AclEntry::negative(Principal::group("eng"))
            .with_permission("write")
            .with_permission("deploy");

        assert_eq!(entry.to_string(), "-Group.eng=deploy,write");
        assert_eq!(
            AclEntry::positive(Principal::user("alice"))
                .with_permission("read")
                .to_string(),
            "+User.alice=read"
        );
    }

    #[test]
    fn it_builds_negative_entries_for_a_principal() {
        let entry = AclEntry::negative(Principal::user("alice"));

        assert_eq!(entry.principal(), Some(&Principal::user("alice")));
        assert_eq!(entry.sign(), Sign::Negative);
        assert_eq!(entry.permissions().count(), 0);
    }
}
