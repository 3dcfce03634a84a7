use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use labsync_common::error::{MembershipError, ValidationError};
use labsync_common::models::AccessLevel;
use labsync_common::request::{GroupId, SyncAction, SyncRequest, parse_group_ids};
use labsync_core::report::{AbortReason, SyncStatus};
use labsync_core::resolver::MembershipResolver;
use labsync_core::synchronizer::{MembershipSynchronizer, SyncOptions, SyncRun};
use tokio_util::sync::CancellationToken;

use crate::fake_directory::{Call, FakeDirectory};

fn add(query: &str, groups: &str) -> SyncRequest {
    SyncRequest::new(query, parse_group_ids(groups).unwrap(), AccessLevel::Developer)
}

async fn run(
    directory: &Arc<FakeDirectory>,
    request: &SyncRequest,
    options: SyncOptions,
) -> SyncRun {
    MembershipSynchronizer::new(directory.clone(), options)
        .run(request)
        .await
        .unwrap()
}

fn alice_directory() -> FakeDirectory {
    FakeDirectory::new()
        .with_user(5, "alice")
        .with_user(6, "bob")
        .with_group(10, "platform")
        .with_group(20, "backend")
}

#[tokio::test]
async fn alice_joins_both_groups() {
    let directory = Arc::new(alice_directory());

    let result = run(&directory, &add("alice", "10,20"), SyncOptions::default()).await;

    assert_eq!(result.user_ids, vec![5]);
    assert_eq!(result.report.attempted(), 2);
    assert_eq!(result.report.succeeded(), 2);
    assert_eq!(result.report.failed(), 0);
    assert_eq!(directory.member_ids(10), vec![5]);
    assert_eq!(directory.member_ids(20), vec![5]);
}

#[tokio::test]
async fn missing_group_is_contained_to_its_pairs() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user(5, "alice")
            .with_group(10, "platform"),
    );

    let result = run(&directory, &add("alice", "10,20"), SyncOptions::default()).await;

    assert_eq!(result.report.attempted(), 2);
    assert_eq!(result.report.succeeded(), 1);
    assert_eq!(result.report.failed(), 1);

    let failure = result.report.failures().next().unwrap();
    assert_eq!(failure.group_id, GroupId::from(20));
    assert!(matches!(failure.error, Some(MembershipError::NotFound(_))));
}

#[tokio::test]
async fn rerun_changes_nothing() {
    let directory = Arc::new(alice_directory());
    let request = add("", "10,20");

    let first = run(&directory, &request, SyncOptions::default()).await;
    let second = run(&directory, &request, SyncOptions::default()).await;

    assert_eq!(first.report.succeeded(), 4);
    assert!(first.report.outcomes().iter().all(|o| !o.already_satisfied));
    assert_eq!(second.report.failed(), 0);
    assert_eq!(second.report.succeeded(), 4);
    assert!(second.report.outcomes().iter().all(|o| o.already_satisfied));
    assert_eq!(directory.member_ids(10), vec![5, 6]);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_rest() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(3)
            .with_group(1, "one")
            .with_group(2, "two")
            .failing(1, 2, MembershipError::Network("connection reset".into())),
    );

    let result = run(&directory, &add("", "1,2"), SyncOptions::default()).await;

    assert_eq!(directory.mutations().len(), 6);
    assert_eq!(result.report.attempted(), 6);
    assert_eq!(result.report.succeeded(), 5);
    assert_eq!(result.report.failed(), 1);
    assert!(!result.report.is_clean());
}

#[tokio::test]
async fn groups_are_the_outer_loop() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(2)
            .with_group(1, "one")
            .with_group(2, "two"),
    );

    let result = run(&directory, &add("", "1,2"), SyncOptions::default()).await;

    let expected = vec![
        (GroupId::from(1), 1),
        (GroupId::from(1), 2),
        (GroupId::from(2), 1),
        (GroupId::from(2), 2),
    ];
    assert_eq!(directory.mutations(), expected);
    let reported: Vec<(GroupId, u64)> = result
        .report
        .outcomes()
        .iter()
        .map(|o| (o.group_id.clone(), o.user_id))
        .collect();
    assert_eq!(reported, expected);
}

#[tokio::test]
async fn resolution_stops_at_the_cap() {
    let directory = Arc::new(FakeDirectory::new().with_user_count(250));
    let resolver = MembershipResolver::new(directory.clone());

    let users = resolver.resolve("", 120).await.unwrap();

    let ids: HashSet<u64> = users.iter().map(|u| u.id).collect();
    assert_eq!(users.len(), 120);
    assert_eq!(ids.len(), 120);
    assert_eq!(
        directory.calls(),
        vec![
            Call::ListUsers { page: 1, per_page: 100 },
            Call::ListUsers { page: 2, per_page: 100 },
        ]
    );
}

#[tokio::test]
async fn empty_group_list_makes_no_calls() {
    let directory = Arc::new(alice_directory());
    let sync = MembershipSynchronizer::new(directory.clone(), SyncOptions::default());

    let err = sync.run(&add("alice", "")).await.unwrap_err();

    assert_eq!(err, ValidationError::MissingGroupIds);
    assert!(directory.calls().is_empty());
}

#[tokio::test]
async fn empty_directory_gives_an_empty_report() {
    let directory = Arc::new(FakeDirectory::new().with_group(10, "platform"));

    let result = run(&directory, &add("", "10"), SyncOptions::default()).await;

    assert!(result.error.is_none());
    assert!(result.user_ids.is_empty());
    assert_eq!(result.report.attempted(), 0);
    assert!(result.report.is_clean());
    assert!(directory.mutations().is_empty());
}

#[tokio::test]
async fn rejected_token_stops_the_run() {
    let directory = Arc::new(
        alice_directory()
            .failing_group(10, MembershipError::Unauthorized("401 Unauthorized".into())),
    );

    let result = run(&directory, &add("", "10,20"), SyncOptions::default()).await;

    assert_eq!(directory.mutations(), vec![(GroupId::from(10), 5)]);
    assert_eq!(result.report.attempted(), 1);
    assert_eq!(result.report.aborted(), Some(AbortReason::Unauthorized));
    assert!(!result.report.is_clean());
}

#[tokio::test]
async fn cancellation_keeps_what_was_done() {
    let cancel = CancellationToken::new();
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(5)
            .with_group(10, "platform")
            .cancelling_after(2, cancel.clone()),
    );
    let options = SyncOptions {
        cancel,
        ..SyncOptions::default()
    };

    let result = run(&directory, &add("", "10"), options).await;

    assert_eq!(result.report.attempted(), 2);
    assert_eq!(result.report.succeeded(), 2);
    assert_eq!(result.report.aborted(), Some(AbortReason::Cancelled));
    assert_eq!(directory.member_ids(10), vec![1, 2]);
}

#[tokio::test]
async fn cancellation_lets_in_flight_requests_finish() {
    let cancel = CancellationToken::new();
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(6)
            .with_group(10, "platform")
            .with_group(20, "backend")
            .with_delay(Duration::from_millis(30))
            .cancelling_after(1, cancel.clone()),
    );
    let options = SyncOptions {
        max_in_flight: 3,
        cancel,
        ..SyncOptions::default()
    };

    let result = run(&directory, &add("", "10,20"), options).await;

    let issued = directory.mutations();
    assert_eq!(
        issued,
        vec![(GroupId::from(10), 1), (GroupId::from(10), 2), (GroupId::from(10), 3)]
    );
    assert_eq!(result.report.attempted(), 3);
    assert_eq!(result.report.succeeded(), 3);
    assert_eq!(result.report.aborted(), Some(AbortReason::Cancelled));
    assert_eq!(directory.member_ids(10), vec![1, 2, 3]);
    assert!(directory.member_ids(20).is_empty());
}

#[tokio::test]
async fn rejected_token_lets_in_flight_requests_finish() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(6)
            .with_group(10, "platform")
            .with_group(20, "backend")
            .with_delay(Duration::from_millis(30))
            .failing_group(10, MembershipError::Unauthorized("401 Unauthorized".into())),
    );
    let options = SyncOptions {
        max_in_flight: 3,
        ..SyncOptions::default()
    };

    let result = run(&directory, &add("", "10,20"), options).await;

    assert_eq!(directory.mutations().len(), 3);
    assert_eq!(result.report.attempted(), 3);
    assert_eq!(result.report.failed(), 3);
    let reported: Vec<u64> = result.report.outcomes().iter().map(|o| o.user_id).collect();
    assert_eq!(reported, vec![1, 2, 3]);
    assert_eq!(result.report.aborted(), Some(AbortReason::Unauthorized));
    assert!(!directory
        .mutations()
        .iter()
        .any(|(group, _)| *group == GroupId::from(20)));
}

#[tokio::test]
async fn timeout_cancels_remaining_pairs() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(20)
            .with_group(10, "platform")
            .with_delay(Duration::from_millis(40)),
    );
    let options = SyncOptions {
        timeout: Some(Duration::from_millis(100)),
        ..SyncOptions::default()
    };

    let result = run(&directory, &add("", "10"), options).await;

    assert!(result.report.attempted() >= 1);
    assert!(result.report.attempted() < 20);
    assert_eq!(result.report.aborted(), Some(AbortReason::Cancelled));
}

#[tokio::test]
async fn concurrency_is_bounded_and_ordered() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user_count(6)
            .with_group(1, "one")
            .with_group(2, "two")
            .with_delay(Duration::from_millis(20)),
    );
    let options = SyncOptions {
        max_in_flight: 3,
        ..SyncOptions::default()
    };

    let result = run(&directory, &add("", "1,2"), options).await;

    assert_eq!(directory.peak_in_flight(), 3);
    assert_eq!(result.report.succeeded(), 12);
    let reported: Vec<(u64, u64)> = result
        .report
        .outcomes()
        .iter()
        .map(|o| (o.group_id.numeric().unwrap(), o.user_id))
        .collect();
    let expected: Vec<(u64, u64)> = [1, 2]
        .into_iter()
        .flat_map(|g| (1..=6).map(move |u| (g, u)))
        .collect();
    assert_eq!(reported, expected);
}

#[tokio::test]
async fn removal_clears_memberships_and_reports_strangers() {
    let directory = Arc::new(
        alice_directory()
            .with_member(10, 5, AccessLevel::Developer)
            .with_member(20, 5, AccessLevel::Guest),
    );
    let request = SyncRequest::removal("", parse_group_ids("10,20").unwrap());

    let result = run(&directory, &request, SyncOptions::default()).await;

    assert!(directory.member_ids(10).is_empty());
    assert!(directory.member_ids(20).is_empty());
    assert_eq!(result.report.succeeded(), 2);
    // bob was never a member
    assert_eq!(result.report.failed(), 2);
    assert!(result
        .report
        .failures()
        .all(|o| o.user_id == 6 && o.action == SyncAction::Remove));
}

#[tokio::test]
async fn explicit_users_skip_the_search() {
    let directory = Arc::new(alice_directory());
    let request = add("ignored", "10").with_user_ids(vec![6, 5, 6]);

    let result = run(&directory, &request, SyncOptions::default()).await;

    assert_eq!(result.user_ids, vec![6, 5]);
    assert!(!directory
        .calls()
        .iter()
        .any(|call| matches!(call, Call::ListUsers { .. })));
    assert_eq!(directory.member_ids(10), vec![5, 6]);
}

#[tokio::test]
async fn report_serializes_counts_and_failures() {
    let directory = Arc::new(
        FakeDirectory::new()
            .with_user(5, "alice")
            .with_group(10, "platform"),
    );

    let result = run(&directory, &add("alice", "10,20"), SyncOptions::default()).await;
    let json = serde_json::to_value(&result.report).unwrap();

    assert_eq!(json["attempted"], 2);
    assert_eq!(json["succeeded"], 1);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["outcomes"][1]["status"], "failure");
    assert_eq!(json["outcomes"][1]["error"]["kind"], "not_found");
    assert_eq!(result.report.outcomes()[0].status, SyncStatus::Success);
}
