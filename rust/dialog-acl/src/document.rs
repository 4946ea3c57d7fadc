//! Serializable forms of ACLs and group directories.
//!
//! Documents are how ACLs are configured and persisted. Loading a document
//! enforces the same invariants as the live API, so an [`Acl`] built from an
//! [`AclDocument`] always has at least one owner and at most one entry per
//! principal and sign.
//!
//! ```rust
//! use dialog_acl::{Acl, AclDocument, Directory, DirectoryDocument, Principal};
//!
//! let directory = DirectoryDocument::from_json(r#"{
//!     "groups": [
//!         { "name": "eng", "members": [{ "kind": "user", "name": "alice" }] }
//!     ]
//! }"#)
//! .map(Directory::from_document)
//! .unwrap();
//!
//! let acl = AclDocument::from_json(r#"{
//!     "name": "deployments",
//!     "owners": [{ "kind": "user", "name": "root" }],
//!     "entries": [
//!         { "principal": { "kind": "group", "name": "eng" }, "permissions": ["deploy"] }
//!     ]
//! }"#)
//! .and_then(|document| Acl::from_document(document, directory))
//! .unwrap();
//!
//! assert!(acl.check_permission(&Principal::user("alice"), &"deploy".into()));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    Acl, AclEntry, DialogAclError, Directory, Group, Owners, Permission, Principal, Sign,
};

/// A single entry of an [`AclDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDocument {
    /// The principal the entry applies to.
    pub principal: Principal,
    /// Whether the entry grants or denies. Defaults to granting.
    #[serde(default)]
    pub sign: Sign,
    /// The permissions listed by the entry.
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

impl From<EntryDocument> for AclEntry {
    fn from(document: EntryDocument) -> Self {
        let mut entry = AclEntry::positive(document.principal);
        if document.sign == Sign::Negative {
            entry.set_negative_permissions();
        }
        for permission in document.permissions {
            entry.add_permission(permission);
        }
        entry
    }
}

/// The serializable form of an [`Acl`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclDocument {
    /// The display name of the ACL.
    pub name: String,
    /// The registered owners. Must not be empty.
    pub owners: Vec<Principal>,
    /// The entries of the ACL.
    #[serde(default)]
    pub entries: Vec<EntryDocument>,
}

impl AclDocument {
    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DialogAclError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render this document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DialogAclError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A single group of a [`DirectoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDocument {
    /// The group name.
    pub name: String,
    /// Whether every principal is a member. Listed members are ignored
    /// when set.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub everyone: bool,
    /// The direct members of the group.
    #[serde(default)]
    pub members: Vec<Principal>,
}

/// The serializable form of a [`Directory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDocument {
    /// The registered groups.
    #[serde(default)]
    pub groups: Vec<GroupDocument>,
}

impl DirectoryDocument {
    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> Result<Self, DialogAclError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render this document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DialogAclError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Directory {
    /// Build a directory from its document form.
    ///
    /// A group listed twice is replaced by its later definition.
    pub fn from_document(document: DirectoryDocument) -> Self {
        let directory = Directory::new();
        for group in document.groups {
            let mut record = if group.everyone {
                Group::everyone(group.name)
            } else {
                Group::new(group.name)
            };
            for member in group.members {
                record.add_member(member);
            }
            directory.insert(record);
        }
        directory
    }

    /// Capture the current groups of this directory.
    pub fn to_document(&self) -> DirectoryDocument {
        let groups = self
            .snapshot()
            .groups()
            .map(|group| GroupDocument {
                name: group.principal().name().to_owned(),
                everyone: group.is_everyone(),
                members: group.members().cloned().collect(),
            })
            .collect();
        DirectoryDocument { groups }
    }
}

impl Acl {
    /// Build an ACL from its document form, resolving groups against
    /// `directory`.
    pub fn from_document(
        document: AclDocument,
        directory: Directory,
    ) -> Result<Self, DialogAclError> {
        let owners = Owners::from_owners(document.owners)?;

        let mut entries = BTreeMap::new();
        for entry in document.entries {
            let key = (entry.principal.clone(), entry.sign);
            if entries.contains_key(&key) {
                let (principal, sign) = key;
                return Err(DialogAclError::DuplicateEntry { principal, sign });
            }
            entries.insert(key, AclEntry::from(entry));
        }

        tracing::debug!(acl = %document.name, entries = entries.len(), "Loaded ACL");
        Ok(Acl::from_parts(document.name, owners, entries, directory))
    }

    /// Capture the current state of this ACL.
    pub fn to_document(&self) -> AclDocument {
        self.with_state(|name, owners, entries| AclDocument {
            name: name.to_owned(),
            owners: owners.owners().cloned().collect(),
            entries: entries
                .iter()
                .map(|((principal, sign), entry)| EntryDocument {
                    principal: principal.clone(),
                    sign: *sign,
                    permissions: entry.permissions().cloned().collect(),
                })
                .collect(),
        })
    }
}
