//! Path-based resource identifiers (`/users`, `/contacts`, `/contacts/{id}`).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Absolute, `/`-separated resource path.
///
/// # Invariants
/// - Starts with `/`, has at least one segment, no empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri {
    path: String,
}

/// Rejected identifier text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUri(pub String);

impl Display for InvalidUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed resource identifier `{}`", self.0)
    }
}

impl std::error::Error for InvalidUri {}

impl ResourceUri {
    /// Parses an absolute path such as `/contacts/12`.
    pub fn parse(raw: &str) -> Result<Self, InvalidUri> {
        let trimmed = raw.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Err(InvalidUri(raw.to_string()));
        };
        if rest.is_empty() || rest.split('/').any(str::is_empty) {
            return Err(InvalidUri(raw.to_string()));
        }
        Ok(Self {
            path: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path[1..].split('/')
    }

    pub fn last_segment(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Returns `self/{id}`.
    pub fn with_appended_id(&self, id: i64) -> Self {
        Self {
            path: format!("{}/{id}", self.path),
        }
    }

    /// Whether `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &ResourceUri) -> bool {
        other
            .path
            .strip_prefix(self.path.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl Display for ResourceUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = InvalidUri;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceUri> for String {
    fn from(value: ResourceUri) -> Self {
        value.path
    }
}

impl std::str::FromStr for ResourceUri {
    type Err = InvalidUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
