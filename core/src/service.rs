//! # Directory Service
//!
//! One method per command. Each method validates its identifiers before
//! touching the directory, then delegates to the client, the resolver or the
//! synchronizer.

use std::sync::Arc;

use labsync_common::directory::DirectoryClient;
use labsync_common::error::{MembershipError, ValidationError};
use labsync_common::models::{AccessLevel, Group, Member, Project, User};
use labsync_common::request::{GroupId, SyncRequest};
use thiserror::Error;
use tracing::info;

use crate::resolver::MembershipResolver;
use crate::synchronizer::{MembershipSynchronizer, ProgressFn, SyncOptions, SyncRun};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Directory(#[from] MembershipError),
}

/// Result of a single membership mutation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberChange {
    Applied,
    /// The user already had a membership in the group.
    AlreadySatisfied,
}

pub struct DirectoryService {
    client: Arc<dyn DirectoryClient>,
    max_results: usize,
}

impl DirectoryService {
    pub fn new(client: Arc<dyn DirectoryClient>, max_results: usize) -> Self {
        Self {
            client,
            max_results,
        }
    }

    pub async fn users(&self, query: &str) -> Result<Vec<User>, CommandError> {
        let resolver = MembershipResolver::new(self.client.clone());
        Ok(resolver.resolve(query, self.max_results).await?)
    }

    pub async fn groups(&self) -> Result<Vec<Group>, CommandError> {
        Ok(self.client.list_groups().await?)
    }

    /// Projects of each group, in the order given. Stops at the first group that fails.
    pub async fn group_projects(
        &self,
        group_ids: &[GroupId],
    ) -> Result<Vec<(GroupId, Vec<Project>)>, CommandError> {
        if group_ids.is_empty() {
            return Err(ValidationError::MissingGroupIds.into());
        }

        let mut projects = Vec::with_capacity(group_ids.len());
        for group in group_ids {
            let listed = self.client.list_group_projects(group).await?;
            projects.push((group.clone(), listed));
        }
        Ok(projects)
    }

    pub async fn team(&self, group: Option<&GroupId>) -> Result<Vec<Member>, CommandError> {
        let group = group.ok_or(ValidationError::MissingGroupId)?;
        Ok(self.client.list_group_members(group).await?)
    }

    pub async fn new_member(
        &self,
        group: Option<&GroupId>,
        user_id: Option<u64>,
        access_level: AccessLevel,
    ) -> Result<MemberChange, CommandError> {
        let group = group.ok_or(ValidationError::MissingGroupId)?;
        let user_id = user_id.ok_or(ValidationError::MissingUserId)?;

        match self
            .client
            .add_group_member(group, user_id, access_level)
            .await
        {
            Ok(()) => {
                info!(%group, user_id, %access_level, "member added");
                Ok(MemberChange::Applied)
            }
            Err(MembershipError::AlreadyMember) => Ok(MemberChange::AlreadySatisfied),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_member(
        &self,
        group: Option<&GroupId>,
        user_id: Option<u64>,
    ) -> Result<(), CommandError> {
        let group = group.ok_or(ValidationError::MissingGroupId)?;
        let user_id = user_id.ok_or(ValidationError::MissingUserId)?;

        self.client.remove_group_member(group, user_id).await?;
        info!(%group, user_id, "member removed");
        Ok(())
    }

    pub async fn sync_members(
        &self,
        request: &SyncRequest,
        options: SyncOptions,
        progress: Option<ProgressFn>,
    ) -> Result<SyncRun, CommandError> {
        let options = SyncOptions {
            max_results: self.max_results,
            ..options
        };
        let mut synchronizer = MembershipSynchronizer::new(self.client.clone(), options);
        if let Some(progress) = progress {
            synchronizer = synchronizer.with_progress(progress);
        }
        Ok(synchronizer.run(request).await?)
    }
}
