//! GitLab v4 REST adapter for [`labsync_common::directory::DirectoryClient`].
//!
//! Owns the wire format: URL layout, `PRIVATE-TOKEN` auth, `X-Next-Page`
//! pagination and the mapping of HTTP statuses onto
//! [`labsync_common::error::MembershipError`].

mod classify;
mod client;
mod wire;

pub use client::{GitLabClient, MAX_PAGE_SIZE};
