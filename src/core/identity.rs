//! Row identity using type-prefixed ULIDs
//!
//! Every stored row is keyed by `PREFIX-ULID`, so an identifier pasted on the
//! command line already says which table it belongs to.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Project category (tree node)
    Cat,
    /// Project
    Prj,
    /// Part
    Part,
    /// Project/part association
    Pp,
    /// Project run
    Run,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Cat => "CAT",
            EntityPrefix::Prj => "PRJ",
            EntityPrefix::Part => "PART",
            EntityPrefix::Pp => "PP",
            EntityPrefix::Run => "RUN",
        }
    }

    /// Human readable name used in error messages
    pub fn entity_name(&self) -> &'static str {
        match self {
            EntityPrefix::Cat => "project category",
            EntityPrefix::Prj => "project",
            EntityPrefix::Part => "part",
            EntityPrefix::Pp => "project part",
            EntityPrefix::Run => "project run",
        }
    }

    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Cat,
            EntityPrefix::Prj,
            EntityPrefix::Part,
            EntityPrefix::Pp,
            EntityPrefix::Run,
        ]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CAT" => Ok(EntityPrefix::Cat),
            "PRJ" => Ok(EntityPrefix::Prj),
            "PART" => Ok(EntityPrefix::Part),
            "PP" => Ok(EntityPrefix::Pp),
            "RUN" => Ok(EntityPrefix::Run),
            _ => Err(IdParseError::InvalidPrefix(s.to_string())),
        }
    }
}

/// A unique row identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    pub fn ulid(&self) -> Ulid {
        self.ulid
    }

    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }

    /// Parse an id and require it to carry the given prefix
    pub fn parse_as(s: &str, expected: EntityPrefix) -> Result<Self, IdParseError> {
        let id: EntityId = s.parse()?;
        if id.prefix != expected {
            return Err(IdParseError::WrongKind {
                id: s.to_string(),
                expected: expected.entity_name(),
            });
        }
        Ok(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for EntityId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for EntityId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse()
            .map_err(|e: IdParseError| FromSqlError::Other(Box::new(e)))
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}' (valid: CAT, PRJ, PART, PP, RUN)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in entity ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),

    #[error("'{id}' is not a {expected} ID")]
    WrongKind { id: String, expected: &'static str },
}
