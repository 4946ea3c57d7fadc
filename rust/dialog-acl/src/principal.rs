use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Whether a principal names a single identity or a group of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// A single identity (a user, a service).
    User,
    /// A group whose members live in a [`Directory`](crate::Directory).
    Group,
}

/// An identity subject to authorization checks.
///
/// Two principals are equal when both their kind and their name match, so a
/// user and a group may share a name without being confused for each other.
/// Principals are plain values: an [`Acl`](crate::Acl) or a
/// [`Group`](crate::Group) refers to them but never owns the identity behind
/// them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Principal {
    kind: PrincipalKind,
    name: String,
}

impl Principal {
    /// Create a user principal.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::User,
            name: name.into(),
        }
    }

    /// Create a group principal.
    ///
    /// This only names the group; its members are registered with a
    /// [`Directory`](crate::Directory).
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::Group,
            name: name.into(),
        }
    }

    /// The name of this principal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind of this principal.
    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    /// Whether this principal names a group.
    pub fn is_group(&self) -> bool {
        self.kind == PrincipalKind::Group
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_distinguishes_users_and_groups_with_the_same_name() {
        assert_ne!(Principal::user("ops"), Principal::group("ops"));
        assert_eq!(Principal::user("ops"), Principal::user("ops"));
    }

    #[test]
    fn it_displays_the_bare_name() {
        assert_eq!(Principal::group("eng").to_string(), "eng");
        assert!(Principal::group("eng").is_group());
        assert!(!Principal::user("alice").is_group());
    }
}
