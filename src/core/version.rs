//! Content version identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a content revision.
///
/// Version ids are positive integers assigned by the remote source in
/// monotonically increasing order and never reused. They are opaque to the
/// updater beyond equality and ordering; there is no semver-style structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u32);

impl VersionId {
    /// Wraps a raw version number.
    ///
    /// The remote source only ever publishes positive ids; zero is accepted
    /// here but will never match a published version.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VersionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for VersionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(Self)
    }
}
