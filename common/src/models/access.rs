use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role a member holds inside a group.
///
/// Ordered by its integer value, which is also how it travels over the wire.
/// Values the directory sends that have no named role are kept as `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AccessLevel {
    NoAccess,
    MinimalAccess,
    Guest,
    Planner,
    Reporter,
    Developer,
    Maintainer,
    Owner,
    Other(u8),
}

impl AccessLevel {
    pub const NAMED: [AccessLevel; 8] = [
        AccessLevel::NoAccess,
        AccessLevel::MinimalAccess,
        AccessLevel::Guest,
        AccessLevel::Planner,
        AccessLevel::Reporter,
        AccessLevel::Developer,
        AccessLevel::Maintainer,
        AccessLevel::Owner,
    ];

    pub fn value(self) -> u8 {
        match self {
            AccessLevel::NoAccess => 0,
            AccessLevel::MinimalAccess => 5,
            AccessLevel::Guest => 10,
            AccessLevel::Planner => 15,
            AccessLevel::Reporter => 20,
            AccessLevel::Developer => 30,
            AccessLevel::Maintainer => 40,
            AccessLevel::Owner => 50,
            AccessLevel::Other(value) => value,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccessLevel::NoAccess => "no_access",
            AccessLevel::MinimalAccess => "minimal_access",
            AccessLevel::Guest => "guest",
            AccessLevel::Planner => "planner",
            AccessLevel::Reporter => "reporter",
            AccessLevel::Developer => "developer",
            AccessLevel::Maintainer => "maintainer",
            AccessLevel::Owner => "owner",
            AccessLevel::Other(_) => "other",
        }
    }

    pub fn is_named(self) -> bool {
        !matches!(self, AccessLevel::Other(_))
    }
}

impl From<u8> for AccessLevel {
    fn from(value: u8) -> Self {
        AccessLevel::NAMED
            .into_iter()
            .find(|level| level.value() == value)
            .unwrap_or(AccessLevel::Other(value))
    }
}

impl From<AccessLevel> for u8 {
    fn from(level: AccessLevel) -> Self {
        level.value()
    }
}

// `Other(30)` and `Developer` are the same level.
impl PartialEq for AccessLevel {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for AccessLevel {}

impl Hash for AccessLevel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl PartialOrd for AccessLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AccessLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl FromStr for AccessLevel {
    type Err = ValidationError;

    /// Accepts a named role's numeric value (`30`) or its name (`developer`, `Developer`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let found = match s.parse::<u8>() {
            Ok(value) => AccessLevel::NAMED
                .into_iter()
                .find(|level| level.value() == value),
            Err(_) => {
                let normalized = s.to_ascii_lowercase().replace(['-', ' '], "_");
                AccessLevel::NAMED
                    .into_iter()
                    .find(|level| level.name() == normalized)
            }
        };
        found.ok_or_else(|| ValidationError::UnknownAccessLevel(s.to_string()))
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.value())
    }
}
