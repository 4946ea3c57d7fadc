use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An opaque capability token such as `read` or `deploy`.
///
/// The ACL never interprets a permission; it only tests set membership.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Create a permission token.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name of this permission.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
