//! The membership synchronization state machine.
//!
//! A run moves through three phases:
//!
//! 1. **ResolvingUsers**: the [`MembershipResolver`] turns the request query into
//!    users. A failure here ends the run with an empty report and nothing mutated.
//! 2. **Synchronizing**: every `(group, user)` pair is applied, groups in request
//!    order and users in resolution order. Failures become outcomes; nothing is thrown.
//! 3. **Completed**: outcomes are sorted back into work-item order and summarized.
//!
//! Within a group up to [`SyncOptions::max_in_flight`] operations run at once.
//! Cancellation (caller token or timeout) and the first `Unauthorized` answer stop
//! new operations from being issued; operations already in flight are still recorded.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use labsync_common::directory::DirectoryClient;
use labsync_common::error::{MembershipError, ValidationError};
use labsync_common::request::{GroupId, Mutation, SyncAction, SyncRequest};
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::report::{AbortReason, SyncOutcome, SyncReport};
use crate::resolver::{DEFAULT_MAX_RESULTS, MembershipResolver};

pub type ProgressFn = Arc<dyn Fn(&SyncOutcome) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    ResolvingUsers,
    Synchronizing,
    Completed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::ResolvingUsers => write!(f, "resolving users"),
            SyncPhase::Synchronizing => write!(f, "synchronizing"),
            SyncPhase::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Clone)]
pub struct SyncOptions {
    /// Cap on users resolved from the query.
    pub max_results: usize,
    /// Concurrent operations within one group. `1` runs strictly one at a time.
    pub max_in_flight: usize,
    /// Stop issuing operations after the first `Unauthorized` answer.
    pub abort_on_unauthorized: bool,
    /// Cancels the run once elapsed.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_in_flight: 1,
            abort_on_unauthorized: true,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct SyncRun {
    /// The users the run targeted, in iteration order.
    pub user_ids: Vec<u64>,
    pub report: SyncReport,
    /// Set when user resolution failed. The report is then empty.
    pub error: Option<MembershipError>,
}

pub struct MembershipSynchronizer {
    client: Arc<dyn DirectoryClient>,
    options: SyncOptions,
    on_outcome: Option<ProgressFn>,
}

struct WorkItem {
    index: usize,
    group: GroupId,
    user_id: u64,
}

impl MembershipSynchronizer {
    pub fn new(client: Arc<dyn DirectoryClient>, options: SyncOptions) -> Self {
        Self {
            client,
            options,
            on_outcome: None,
        }
    }

    /// Invokes `callback` for every outcome as it is recorded (completion order).
    pub fn with_progress(mut self, callback: ProgressFn) -> Self {
        self.on_outcome = Some(callback);
        self
    }

    /// Executes one synchronization run.
    ///
    /// Only request validation fails this call. Every later failure is data in
    /// the returned [`SyncRun`].
    pub async fn run(&self, request: &SyncRequest) -> Result<SyncRun, ValidationError> {
        let mutation: Mutation = request.validate()?;

        let cancel: CancellationToken = self.options.cancel.child_token();
        let timer = self.options.timeout.map(|timeout| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                cancel.cancel();
            })
        });

        enter(SyncPhase::ResolvingUsers);
        let run = match self.target_users(request).await {
            Ok(user_ids) => {
                enter(SyncPhase::Synchronizing);
                let report = self.synchronize(request, mutation, &user_ids, &cancel).await;
                SyncRun {
                    user_ids,
                    report,
                    error: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "user resolution failed, nothing was changed");
                SyncRun {
                    user_ids: Vec::new(),
                    report: SyncReport::empty(),
                    error: Some(err),
                }
            }
        };
        enter(SyncPhase::Completed);

        if let Some(timer) = timer {
            timer.abort();
        }
        Ok(run)
    }

    async fn target_users(&self, request: &SyncRequest) -> Result<Vec<u64>, MembershipError> {
        if let Some(ids) = &request.user_ids {
            let mut seen: HashSet<u64> = HashSet::new();
            return Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect());
        }

        let resolver = MembershipResolver::new(self.client.clone());
        let users = resolver
            .resolve(&request.query, self.options.max_results)
            .await?;
        info!(query = %request.query, count = users.len(), "resolved users");
        Ok(users.into_iter().map(|user| user.id).collect())
    }

    async fn synchronize(
        &self,
        request: &SyncRequest,
        mutation: Mutation,
        user_ids: &[u64],
        cancel: &CancellationToken,
    ) -> SyncReport {
        let max_in_flight: usize = self.options.max_in_flight.max(1);
        let mut dispatch = Dispatch::new(self, mutation);
        let mut index: usize = 0;

        'groups: for group in &request.group_ids {
            for &user_id in user_ids {
                while dispatch.in_flight() >= max_in_flight {
                    dispatch.collect_next().await;
                }
                if dispatch.aborted.is_none() && cancel.is_cancelled() {
                    dispatch.aborted = Some(AbortReason::Cancelled);
                }
                if dispatch.aborted.is_some() {
                    break 'groups;
                }

                dispatch.spawn(WorkItem {
                    index,
                    group: group.clone(),
                    user_id,
                });
                index += 1;
            }

            // Concurrency never spans two groups.
            dispatch.drain().await;
            if dispatch.aborted.is_some() {
                break;
            }
        }

        dispatch.drain().await;
        dispatch.finish()
    }
}

/// In-flight operations of one run and the outcomes collected so far.
struct Dispatch<'a> {
    sync: &'a MembershipSynchronizer,
    mutation: Mutation,
    tasks: JoinSet<(usize, SyncOutcome)>,
    pending: HashMap<Id, WorkItem>,
    outcomes: Vec<(usize, SyncOutcome)>,
    aborted: Option<AbortReason>,
}

impl<'a> Dispatch<'a> {
    fn new(sync: &'a MembershipSynchronizer, mutation: Mutation) -> Self {
        Self {
            sync,
            mutation,
            tasks: JoinSet::new(),
            pending: HashMap::new(),
            outcomes: Vec::new(),
            aborted: None,
        }
    }

    fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    fn spawn(&mut self, item: WorkItem) {
        let client = self.sync.client.clone();
        let (slot, group, user_id, mutation) =
            (item.index, item.group.clone(), item.user_id, self.mutation);
        let handle = self.tasks.spawn(async move {
            let outcome = apply(client.as_ref(), group, user_id, mutation).await;
            (slot, outcome)
        });
        self.pending.insert(handle.id(), item);
    }

    async fn drain(&mut self) {
        while !self.tasks.is_empty() {
            self.collect_next().await;
        }
    }

    async fn collect_next(&mut self) {
        let (index, outcome) = match self.tasks.join_next_with_id().await {
            Some(Ok((id, result))) => {
                self.pending.remove(&id);
                result
            }
            Some(Err(err)) => match self.pending.remove(&err.id()) {
                Some(item) => {
                    let error =
                        MembershipError::Malformed(format!("operation did not complete: {err}"));
                    let action = self.mutation.action();
                    let outcome = SyncOutcome::failure(item.group, item.user_id, action, error);
                    (item.index, outcome)
                }
                None => return,
            },
            None => return,
        };

        if self.sync.options.abort_on_unauthorized
            && self.aborted.is_none()
            && matches!(outcome.error, Some(MembershipError::Unauthorized(_)))
        {
            self.aborted = Some(AbortReason::Unauthorized);
        }

        if let Some(callback) = &self.sync.on_outcome {
            callback(&outcome);
        }
        self.outcomes.push((index, outcome));
    }

    fn finish(mut self) -> SyncReport {
        if let Some(reason) = self.aborted {
            warn!(?reason, completed = self.outcomes.len(), "synchronization stopped early");
        }
        self.outcomes.sort_by_key(|(index, _)| *index);
        let outcomes = self.outcomes.into_iter().map(|(_, outcome)| outcome).collect();
        SyncReport::new(outcomes, self.aborted)
    }
}

/// Applies one mutation and classifies the answer.
///
/// A duplicate-membership answer on add means the target state already holds,
/// so it counts as success.
async fn apply(
    client: &dyn DirectoryClient,
    group: GroupId,
    user_id: u64,
    mutation: Mutation,
) -> SyncOutcome {
    let action: SyncAction = mutation.action();
    let result = match mutation {
        Mutation::Add(level) => client.add_group_member(&group, user_id, level).await,
        Mutation::Remove => client.remove_group_member(&group, user_id).await,
    };

    match result {
        Ok(()) => {
            info!(%group, user_id, %action, "membership updated");
            SyncOutcome::success(group, user_id, action)
        }
        Err(MembershipError::AlreadyMember) if action == SyncAction::Add => {
            debug!(%group, user_id, "already a member");
            SyncOutcome::already_satisfied(group, user_id, action)
        }
        Err(err) => {
            warn!(%group, user_id, %action, error = %err, "membership update failed");
            SyncOutcome::failure(group, user_id, action, err)
        }
    }
}

fn enter(phase: SyncPhase) {
    debug!(%phase, "sync phase");
}
