//! In-memory directory shared by the scenario tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use labsync_common::directory::{DirectoryClient, DirectoryResult, check_paging};
use labsync_common::error::MembershipError;
use labsync_common::models::{AccessLevel, Group, Member, Project, User};
use labsync_common::request::GroupId;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListUsers { page: u32, per_page: u32 },
    Add(GroupId, u64, AccessLevel),
    Remove(GroupId, u64),
}

struct FakeGroup {
    group: Group,
    projects: Vec<Project>,
    members: BTreeMap<u64, AccessLevel>,
}

#[derive(Default)]
pub struct FakeDirectory {
    users: Vec<User>,
    groups: Mutex<BTreeMap<String, FakeGroup>>,
    failures: HashMap<(GroupId, u64), MembershipError>,
    group_failures: HashMap<GroupId, MembershipError>,
    delay: Option<Duration>,
    cancel_after: Option<(usize, CancellationToken)>,
    mutations: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Users `user-1 ..= user-count`.
    pub fn with_user_count(mut self, count: u64) -> Self {
        self.users
            .extend((1..=count).map(|id| User::new(id, format!("user-{id}"))));
        self
    }

    pub fn with_user(mut self, id: u64, username: &str) -> Self {
        self.users.push(
            User::new(id, username)
                .with_display_name(username.to_uppercase())
                .with_email(format!("{username}@example.com")),
        );
        self
    }

    pub fn with_group(self, id: u64, path: &str) -> Self {
        let group = Group {
            id,
            name: path.to_uppercase(),
            path: path.to_string(),
            description: String::new(),
        };
        self.groups.lock().unwrap().insert(
            id.to_string(),
            FakeGroup {
                group,
                projects: Vec::new(),
                members: BTreeMap::new(),
            },
        );
        self
    }

    pub fn with_project(self, group: u64, id: u64, name: &str) -> Self {
        if let Some(entry) = self.groups.lock().unwrap().get_mut(&group.to_string()) {
            entry.projects.push(Project {
                id,
                name: name.to_string(),
            });
        }
        self
    }

    pub fn with_member(self, group: u64, user_id: u64, level: AccessLevel) -> Self {
        if let Some(entry) = self.groups.lock().unwrap().get_mut(&group.to_string()) {
            entry.members.insert(user_id, level);
        }
        self
    }

    /// Mutations of `user_id` in `group` answer `error`.
    pub fn failing(mut self, group: u64, user_id: u64, error: MembershipError) -> Self {
        self.failures.insert((GroupId::from(group), user_id), error);
        self
    }

    /// Every call touching `group` answers `error`.
    pub fn failing_group(mut self, group: u64, error: MembershipError) -> Self {
        self.group_failures.insert(GroupId::from(group), error);
        self
    }

    /// Each mutation sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Cancels `token` once `count` mutations have been answered.
    pub fn cancelling_after(mut self, count: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((count, token));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<(GroupId, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Add(group, user, _) | Call::Remove(group, user) => Some((group, user)),
                Call::ListUsers { .. } => None,
            })
            .collect()
    }

    pub fn member_ids(&self, group: u64) -> Vec<u64> {
        self.groups
            .lock()
            .unwrap()
            .get(&group.to_string())
            .map(|entry| entry.members.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted(&self, group: &GroupId, user_id: u64) -> Option<MembershipError> {
        self.group_failures
            .get(group)
            .or_else(|| self.failures.get(&(group.clone(), user_id)))
            .cloned()
    }

    fn group_error(&self, group: &GroupId) -> DirectoryResult<()> {
        match self.group_failures.get(group) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn mutate<F>(&self, group: &GroupId, user_id: u64, change: F) -> DirectoryResult<()>
    where
        F: FnOnce(&mut FakeGroup) -> DirectoryResult<()>,
    {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match self.scripted(group, user_id) {
            Some(err) => Err(err),
            None => match self.groups.lock().unwrap().get_mut(group.as_str()) {
                Some(entry) => change(entry),
                None => Err(MembershipError::NotFound(format!("404 Group Not Found: {group}"))),
            },
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let answered = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((count, token)) = &self.cancel_after {
            if answered >= *count {
                token.cancel();
            }
        }
        result
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_users(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
    ) -> DirectoryResult<Vec<User>> {
        check_paging(page, per_page)?;
        self.record(Call::ListUsers { page, per_page });

        let start = (page as usize - 1) * per_page as usize;
        Ok(self
            .users
            .iter()
            .filter(|user| query.is_empty() || user.username.contains(query))
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn list_groups(&self) -> DirectoryResult<Vec<Group>> {
        let groups = self.groups.lock().unwrap();
        Ok(groups.values().map(|entry| entry.group.clone()).collect())
    }

    async fn list_group_projects(&self, group: &GroupId) -> DirectoryResult<Vec<Project>> {
        self.group_error(group)?;
        let groups = self.groups.lock().unwrap();
        groups
            .get(group.as_str())
            .map(|entry| entry.projects.clone())
            .ok_or_else(|| MembershipError::NotFound(format!("404 Group Not Found: {group}")))
    }

    async fn list_group_members(&self, group: &GroupId) -> DirectoryResult<Vec<Member>> {
        self.group_error(group)?;
        let groups = self.groups.lock().unwrap();
        let entry = groups
            .get(group.as_str())
            .ok_or_else(|| MembershipError::NotFound(format!("404 Group Not Found: {group}")))?;

        Ok(entry
            .members
            .iter()
            .map(|(id, level)| {
                let username = self
                    .users
                    .iter()
                    .find(|user| user.id == *id)
                    .map(|user| user.username.clone())
                    .unwrap_or_default();
                Member {
                    id: *id,
                    display_name: username.clone(),
                    username,
                    access_level: *level,
                }
            })
            .collect())
    }

    async fn add_group_member(
        &self,
        group: &GroupId,
        user_id: u64,
        access_level: AccessLevel,
    ) -> DirectoryResult<()> {
        self.record(Call::Add(group.clone(), user_id, access_level));
        self.mutate(group, user_id, |entry| {
            if entry.members.contains_key(&user_id) {
                return Err(MembershipError::AlreadyMember);
            }
            entry.members.insert(user_id, access_level);
            Ok(())
        })
        .await
    }

    async fn remove_group_member(&self, group: &GroupId, user_id: u64) -> DirectoryResult<()> {
        self.record(Call::Remove(group.clone(), user_id));
        self.mutate(group, user_id, |entry| match entry.members.remove(&user_id) {
            Some(_) => Ok(()),
            None => Err(MembershipError::NotFound("404 Not found".into())),
        })
        .await
    }
}
