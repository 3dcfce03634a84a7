//! # Command Input
//!
//! Caller input for membership commands, validated before anything reaches
//! the remote directory.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;
use crate::models::AccessLevel;

/// Reference to a group: a numeric id (`42`) or a full path (`platform/backend`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl FromStr for GroupId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(ValidationError::MissingGroupId);
        }
        if trimmed.chars().any(char::is_whitespace) || trimmed.contains("//") {
            return Err(ValidationError::InvalidGroupId(s.to_string()));
        }
        Ok(GroupId(trimmed.to_string()))
    }
}

impl From<u64> for GroupId {
    fn from(id: u64) -> Self {
        GroupId(id.to_string())
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses a comma-separated list of user ids, dropping duplicates.
pub fn parse_user_ids(s: &str) -> Result<Vec<u64>, ValidationError> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut ids: Vec<u64> = Vec::new();
    for part in s.split(',').filter(|part| !part.trim().is_empty()) {
        let id = parse_user_id(part)?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(ValidationError::MissingUserId);
    }
    Ok(ids)
}

/// Parses a comma-separated list of group references (e.g. `"10, 20,platform/api"`).
///
/// Blank entries are skipped and duplicates dropped, keeping the first
/// occurrence so request order is preserved.
pub fn parse_group_ids(s: &str) -> Result<Vec<GroupId>, ValidationError> {
    let mut ids: Vec<GroupId> = Vec::new();
    for part in s.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        ids.push(part.parse()?);
    }
    Ok(dedup_group_ids(ids))
}

pub fn dedup_group_ids(ids: impl IntoIterator<Item = GroupId>) -> Vec<GroupId> {
    let mut seen: HashSet<GroupId> = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

pub fn parse_user_id(s: &str) -> Result<u64, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUserId);
    }
    trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidUserId(s.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Add,
    Remove,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Add => write!(f, "add"),
            SyncAction::Remove => write!(f, "remove"),
        }
    }
}

/// The change applied to every `(group, user)` pair of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Add(AccessLevel),
    Remove,
}

impl Mutation {
    pub fn action(self) -> SyncAction {
        match self {
            Mutation::Add(_) => SyncAction::Add,
            Mutation::Remove => SyncAction::Remove,
        }
    }
}

/// One synchronization run's worth of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Free-text user search. Empty means every user, subject to the result cap.
    pub query: String,
    pub group_ids: Vec<GroupId>,
    /// Role granted on add. Not used by removals.
    pub access_level: Option<AccessLevel>,
    /// Replaces the search: exactly these users are targeted.
    pub user_ids: Option<Vec<u64>>,
    pub action: SyncAction,
}

impl SyncRequest {
    /// Adds the users matching `query` to every group with `access_level`.
    pub fn new(
        query: impl Into<String>,
        group_ids: impl IntoIterator<Item = GroupId>,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            query: query.into(),
            group_ids: dedup_group_ids(group_ids),
            access_level: Some(access_level),
            user_ids: None,
            action: SyncAction::Add,
        }
    }

    /// Removes the users matching `query` from every group.
    pub fn removal(query: impl Into<String>, group_ids: impl IntoIterator<Item = GroupId>) -> Self {
        Self {
            query: query.into(),
            group_ids: dedup_group_ids(group_ids),
            access_level: None,
            user_ids: None,
            action: SyncAction::Remove,
        }
    }

    pub fn with_user_ids(mut self, user_ids: Vec<u64>) -> Self {
        self.user_ids = Some(user_ids);
        self
    }

    pub fn mutation(&self) -> Result<Mutation, ValidationError> {
        match (self.action, self.access_level) {
            (SyncAction::Add, Some(level)) => Ok(Mutation::Add(level)),
            (SyncAction::Add, None) => Err(ValidationError::MissingAccessLevel),
            (SyncAction::Remove, _) => Ok(Mutation::Remove),
        }
    }

    pub fn validate(&self) -> Result<Mutation, ValidationError> {
        if self.group_ids.is_empty() {
            return Err(ValidationError::MissingGroupIds);
        }
        self.mutation()
    }
}
