//! The single point of contact with the remote directory service.
//!
//! Implementations map requests and responses and classify failures into
//! [`MembershipError`]. They hold no business rules and no state between calls.

use async_trait::async_trait;

use crate::error::MembershipError;
use crate::models::{AccessLevel, Group, Member, Project, User};
use crate::request::GroupId;

pub type DirectoryResult<T> = Result<T, MembershipError>;

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Returns page `page` (1-based) of the users matching `query`, at most `per_page` long.
    ///
    /// Backends with a smaller page cap must sub-page internally until
    /// `per_page` users are collected or the service runs out of results.
    /// An empty `query` matches every user.
    async fn list_users(&self, query: &str, page: u32, per_page: u32) -> DirectoryResult<Vec<User>>;

    async fn list_groups(&self) -> DirectoryResult<Vec<Group>>;

    async fn list_group_projects(&self, group: &GroupId) -> DirectoryResult<Vec<Project>>;

    async fn list_group_members(&self, group: &GroupId) -> DirectoryResult<Vec<Member>>;

    /// Fails with [`MembershipError::AlreadyMember`] when the service reports a duplicate.
    async fn add_group_member(
        &self,
        group: &GroupId,
        user_id: u64,
        access_level: AccessLevel,
    ) -> DirectoryResult<()>;

    async fn remove_group_member(&self, group: &GroupId, user_id: u64) -> DirectoryResult<()>;
}

/// Rejects paging arguments outside `page >= 1`, `per_page > 0`.
pub fn check_paging(page: u32, per_page: u32) -> DirectoryResult<()> {
    if page == 0 || per_page == 0 {
        return Err(MembershipError::InvalidPaging { page, per_page });
    }
    Ok(())
}
