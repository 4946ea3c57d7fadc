#![warn(missing_docs)]

//! Access control lists with owner registries and recursive groups.
//!
//! An [`Acl`] holds [`AclEntry`] values that grant (positive) or deny
//! (negative) sets of [`Permission`]s to [`Principal`]s. A principal may be a
//! group, in which case the entry applies to every member of the group,
//! including members of nested groups. Groups are registered in a
//! [`Directory`] that the ACL consults when resolving permissions.
//!
//! # Quick Example
//!
//! ```rust
//! use dialog_acl::{Acl, AclEntry, Directory, Principal};
//!
//! # fn main() -> Result<(), dialog_acl::DialogAclError> {
//! let directory = Directory::new();
//! let eng = directory.create_group("eng");
//! let alice = Principal::user("alice");
//! directory.add_member(&eng, alice.clone())?;
//!
//! let owner = Principal::user("owner");
//! let acl = Acl::new("deployments", owner.clone(), directory);
//!
//! acl.add_entry(&owner, AclEntry::positive(eng.clone()).with_permission("deploy"))?;
//! acl.add_entry(&owner, AclEntry::positive(alice.clone()).with_permission("read"))?;
//!
//! assert!(acl.check_permission(&alice, &"deploy".into()));
//! assert!(acl.check_permission(&alice, &"read".into()));
//! # Ok(())
//! # }
//! ```
//!
//! # Resolution
//!
//! | Source | Precedence |
//! |--------|------------|
//! | Individual positive entry | Always granted |
//! | Individual negative entry | Removes anything granted through groups |
//! | Group positive entries | Granted unless some group also denies it |
//! | Group negative entries | Cancels the same permission from any group |
//!
//! # Ownership
//!
//! Only owners may change an ACL. An ACL is created with exactly one owner
//! and the last owner can never be removed, so an ACL cannot become
//! unmanageable. Rejected mutations fail with [`DialogAclError`] and leave
//! the ACL untouched; "already present" and "not found" outcomes are plain
//! `false` results.

mod error;
pub use error::*;

mod principal;
pub use principal::*;

mod permission;
pub use permission::*;

mod group;
pub use group::*;

mod entry;
pub use entry::*;

mod owner;
pub use owner::*;

mod acl;
pub use acl::*;

mod document;
pub use document::*;
