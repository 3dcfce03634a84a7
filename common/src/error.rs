//! Error taxonomy.
//!
//! * [`ConfigurationError`]: the directory client cannot be built. Fatal.
//! * [`ValidationError`]: a command is missing or has a malformed identifier.
//!   Raised before any remote call.
//! * [`MembershipError`]: a remote operation failed, classified by the client.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config field '{0}' is empty")]
    MissingField(&'static str),

    #[error("invalid base url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("cannot build http client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one group id is required")]
    MissingGroupIds,

    #[error("a group id is required")]
    MissingGroupId,

    #[error("a user id is required")]
    MissingUserId,

    #[error("an access level is required to add members")]
    MissingAccessLevel,

    #[error("invalid group id '{0}'")]
    InvalidGroupId(String),

    #[error("invalid user id '{0}'")]
    InvalidUserId(String),

    #[error("unknown access level '{0}'")]
    UnknownAccessLevel(String),
}

/// Failure of a single remote directory operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MembershipError {
    /// The group or user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The token was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited{}", retry_hint(*.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    /// Transport-level failure. Retryable.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with something we could not interpret.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The service reported that the user already belongs to the group.
    #[error("user is already a member of the group")]
    AlreadyMember,

    #[error("invalid paging: page {page}, per_page {per_page}")]
    InvalidPaging { page: u32, per_page: u32 },
}

impl MembershipError {
    pub fn kind(&self) -> &'static str {
        match self {
            MembershipError::NotFound(_) => "not_found",
            MembershipError::Unauthorized(_) => "unauthorized",
            MembershipError::RateLimited { .. } => "rate_limited",
            MembershipError::Network(_) => "network",
            MembershipError::Malformed(_) => "malformed",
            MembershipError::AlreadyMember => "already_member",
            MembershipError::InvalidPaging { .. } => "invalid_paging",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MembershipError::Network(_) | MembershipError::RateLimited { .. }
        )
    }
}

fn retry_hint(retry_after_secs: Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(", retry after {secs}s"),
        None => String::new(),
    }
}
