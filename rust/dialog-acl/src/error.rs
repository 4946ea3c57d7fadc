use crate::{Principal, Sign};
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogAclError {
    /// The caller attempted a mutation without being an owner.
    #[error("Not authorized: '{principal}' is not an owner")]
    NotOwner {
        /// The principal that attempted the mutation.
        principal: Principal,
    },

    /// Removing the owner would leave the registry empty.
    #[error("Cannot remove '{principal}': it is the last owner")]
    LastOwner {
        /// The sole remaining owner.
        principal: Principal,
    },

    /// An entry was used before a principal was bound to it.
    #[error("Entry has no principal bound")]
    UnboundEntry,

    /// A membership operation named a group the directory does not hold.
    #[error("Unknown group: {group}")]
    UnknownGroup {
        /// The group that was not found.
        group: Principal,
    },

    /// A loaded document declared no owners.
    #[error("ACL document declares no owners")]
    NoOwners,

    /// A loaded document declared two entries with the same key.
    #[error("Duplicate {sign} entry for '{principal}'")]
    DuplicateEntry {
        /// The principal of the duplicated entry.
        principal: Principal,
        /// The sign of the duplicated entry.
        sign: Sign,
    },

    /// A document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DialogAclError {
    fn from(value: serde_json::Error) -> Self {
        DialogAclError::Serialization(value.to_string())
    }
}
