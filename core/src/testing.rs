//! Directory stubs for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use labsync_common::directory::{DirectoryClient, DirectoryResult, check_paging};
use labsync_common::error::MembershipError;
use labsync_common::models::{AccessLevel, Group, Member, Project, User};
use labsync_common::request::GroupId;

/// Serves `list_users` from a fixed list and records each `(page, per_page)` call.
pub struct UserPages {
    users: Vec<User>,
    repeat_first_page: bool,
    error: Option<MembershipError>,
    calls: Mutex<Vec<(u32, u32)>>,
}

impl UserPages {
    pub fn with_users(count: u64) -> Self {
        Self {
            users: (1..=count).map(|id| User::new(id, format!("user-{id}"))).collect(),
            repeat_first_page: false,
            error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every page returns the same `count` users.
    pub fn repeating(count: u64) -> Self {
        Self {
            repeat_first_page: true,
            ..Self::with_users(count)
        }
    }

    pub fn failing(mut self, error: MembershipError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for UserPages {
    async fn list_users(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> DirectoryResult<Vec<User>> {
        check_paging(page, per_page)?;
        self.calls.lock().unwrap().push((page, per_page));
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        let matching: Vec<User> = self
            .users
            .iter()
            .filter(|u| query.is_empty() || u.username.contains(query))
            .cloned()
            .collect();
        let page = if self.repeat_first_page { 1 } else { page };
        let start = ((page - 1) * per_page) as usize;
        Ok(matching.into_iter().skip(start).take(per_page as usize).collect())
    }

    async fn list_groups(&self) -> DirectoryResult<Vec<Group>> {
        Ok(Vec::new())
    }

    async fn list_group_projects(&self, _group: &GroupId) -> DirectoryResult<Vec<Project>> {
        Ok(Vec::new())
    }

    async fn list_group_members(&self, _group: &GroupId) -> DirectoryResult<Vec<Member>> {
        Ok(Vec::new())
    }

    async fn add_group_member(
        &self,
        _group: &GroupId,
        _user_id: u64,
        _access_level: AccessLevel,
    ) -> DirectoryResult<()> {
        Ok(())
    }

    async fn remove_group_member(&self, _group: &GroupId, _user_id: u64) -> DirectoryResult<()> {
        Ok(())
    }
}

/// A small in-memory directory with scripted mutation failures.
///
/// Membership is tracked so repeated adds hit [`MembershipError::AlreadyMember`].
#[derive(Default)]
pub struct Recorder {
    pub users: Vec<User>,
    members: Mutex<HashMap<GroupId, Vec<u64>>>,
    failures: HashMap<(GroupId, u64), MembershipError>,
    calls: Mutex<Vec<(GroupId, u64)>>,
}

impl Recorder {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub fn fail(mut self, group: u64, user_id: u64, error: MembershipError) -> Self {
        self.failures.insert((GroupId::from(group), user_id), error);
        self
    }

    pub fn calls(&self) -> Vec<(GroupId, u64)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, group: &GroupId, user_id: u64) -> DirectoryResult<()> {
        self.calls.lock().unwrap().push((group.clone(), user_id));
        match self.failures.get(&(group.clone(), user_id)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DirectoryClient for Recorder {
    async fn list_users(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> DirectoryResult<Vec<User>> {
        check_paging(page, per_page)?;
        let start = ((page - 1) * per_page) as usize;
        Ok(self
            .users
            .iter()
            .filter(|u| query.is_empty() || u.username.contains(query))
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn list_groups(&self) -> DirectoryResult<Vec<Group>> {
        Ok(Vec::new())
    }

    async fn list_group_projects(&self, _group: &GroupId) -> DirectoryResult<Vec<Project>> {
        Ok(Vec::new())
    }

    async fn list_group_members(&self, _group: &GroupId) -> DirectoryResult<Vec<Member>> {
        Ok(Vec::new())
    }

    async fn add_group_member(
        &self,
        group: &GroupId,
        user_id: u64,
        _access_level: AccessLevel,
    ) -> DirectoryResult<()> {
        self.record(group, user_id)?;
        let mut members = self.members.lock().unwrap();
        let entry = members.entry(group.clone()).or_default();
        if entry.contains(&user_id) {
            return Err(MembershipError::AlreadyMember);
        }
        entry.push(user_id);
        Ok(())
    }

    async fn remove_group_member(&self, group: &GroupId, user_id: u64) -> DirectoryResult<()> {
        self.record(group, user_id)?;
        let mut members = self.members.lock().unwrap();
        let entry = members.entry(group.clone()).or_default();
        match entry.iter().position(|id| *id == user_id) {
            Some(idx) => {
                entry.remove(idx);
                Ok(())
            }
            None => Err(MembershipError::NotFound("404 Not found".into())),
        }
    }
}
