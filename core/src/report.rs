//! Outcome types for a synchronization run.

use serde::Serialize;

use labsync_common::error::MembershipError;
use labsync_common::request::{GroupId, SyncAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Failure,
}

/// Result of one attempted `(group, user)` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub group_id: GroupId,
    pub user_id: u64,
    pub action: SyncAction,
    pub status: SyncStatus,
    /// The directory answered that the membership already exists. For an add,
    /// the existing access level is left as it was, even if it differs.
    pub already_satisfied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MembershipError>,
}

impl SyncOutcome {
    pub fn success(group_id: GroupId, user_id: u64, action: SyncAction) -> Self {
        Self {
            group_id,
            user_id,
            action,
            status: SyncStatus::Success,
            already_satisfied: false,
            error: None,
        }
    }

    pub fn already_satisfied(group_id: GroupId, user_id: u64, action: SyncAction) -> Self {
        Self {
            already_satisfied: true,
            ..Self::success(group_id, user_id, action)
        }
    }

    pub fn failure(
        group_id: GroupId,
        user_id: u64,
        action: SyncAction,
        error: MembershipError,
    ) -> Self {
        Self {
            group_id,
            user_id,
            action,
            status: SyncStatus::Failure,
            already_satisfied: false,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

/// Why a run stopped issuing operations before exhausting its work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The token was rejected; every remaining call would fail the same way.
    Unauthorized,
    /// The caller cancelled or the run timed out.
    Cancelled,
}

/// Ordered outcomes of a run plus their summary counts. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    outcomes: Vec<SyncOutcome>,
    attempted: usize,
    succeeded: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    aborted: Option<AbortReason>,
}

impl SyncReport {
    pub fn new(outcomes: Vec<SyncOutcome>, aborted: Option<AbortReason>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        let failed = outcomes.len() - succeeded;
        Self {
            outcomes,
            attempted: succeeded + failed,
            succeeded,
            failed,
            aborted,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn aborted(&self) -> Option<AbortReason> {
        self.aborted
    }

    pub fn successes(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// No failures and the run was not cut short.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.aborted.is_none()
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::empty()
    }
}
