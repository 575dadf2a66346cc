use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Misconfiguration;

/// Depth of a grant. Each level includes every capability below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PermissionLevel {
    None = 0,
    #[default]
    Read = 1,
    Update = 2,
    Create = 3,
    Delete = 4,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("permission level must be between 0 and 4, got {0}")]
pub struct LevelOutOfRange(pub i64);

impl PermissionLevel {
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Update => "update",
            PermissionLevel::Create => "create",
            PermissionLevel::Delete => "delete",
        }
    }

    /// Converts a level read back from storage; out-of-range values are a data defect.
    pub fn from_stored(value: i64) -> Result<Self, Misconfiguration> {
        Self::try_from(value).map_err(|_| Misconfiguration::InvalidPermissionLevel { value })
    }
}

impl TryFrom<i64> for PermissionLevel {
    type Error = LevelOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PermissionLevel::None),
            1 => Ok(PermissionLevel::Read),
            2 => Ok(PermissionLevel::Update),
            3 => Ok(PermissionLevel::Create),
            4 => Ok(PermissionLevel::Delete),
            other => Err(LevelOutOfRange(other)),
        }
    }
}

impl From<PermissionLevel> for i64 {
    fn from(level: PermissionLevel) -> Self {
        level.as_i64()
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Row-level reach of a grant.
///
/// Only recorded for now: every scope authorizes all records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    #[default]
    All,
    Own,
    Team,
    Department,
}

impl PermissionScope {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionScope::All => "all",
            PermissionScope::Own => "own",
            PermissionScope::Team => "team",
            PermissionScope::Department => "department",
        }
    }

    /// Whether the grant should narrow queries to a subset of rows.
    // TODO: apply own/team/department filtering once records carry owner and team columns.
    pub fn restricts_rows(self) -> bool {
        match self {
            PermissionScope::All
            | PermissionScope::Own
            | PermissionScope::Team
            | PermissionScope::Department => false,
        }
    }
}

impl FromStr for PermissionScope {
    type Err = Misconfiguration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PermissionScope::All),
            "own" => Ok(PermissionScope::Own),
            "team" => Ok(PermissionScope::Team),
            "department" => Ok(PermissionScope::Department),
            _ => Err(Misconfiguration::InvalidScope { value: s.to_string() }),
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
