use std::process::ExitCode;
use std::time::{Duration, Instant};

use colored::*;
use labsync_common::config::OutputConfig;
use labsync_common::error::ValidationError;
use labsync_common::request::{GroupId, SyncRequest, parse_group_ids, parse_user_ids};
use labsync_common::success;
use labsync_core::report::{AbortReason, SyncReport};
use labsync_core::service::DirectoryService;
use labsync_core::synchronizer::{SyncOptions, SyncRun};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, warn};

use crate::commands::SyncArgs;
use crate::mprint;
use crate::terminal::{colors, format, print, progress};

/// Exit status of a run that recorded failures or stopped early.
const PARTIAL_EXIT: u8 = 2;

fn build_request(args: &SyncArgs) -> anyhow::Result<SyncRequest> {
    let group_ids: Vec<GroupId> = match &args.ids {
        Some(ids) => parse_group_ids(ids)?,
        None => Vec::new(),
    };

    let mut request: SyncRequest = match (args.remove, args.access_level) {
        (true, _) => SyncRequest::removal(args.search.as_str(), group_ids),
        (false, Some(level)) => SyncRequest::new(args.search.as_str(), group_ids, level),
        (false, None) => return Err(ValidationError::MissingAccessLevel.into()),
    };
    if let Some(users) = &args.users {
        request = request.with_user_ids(parse_user_ids(users)?);
    }
    Ok(request)
}

fn build_options(args: &SyncArgs, cancel: CancellationToken) -> SyncOptions {
    SyncOptions {
        max_in_flight: usize::from(args.concurrency),
        abort_on_unauthorized: !args.no_fast_abort,
        timeout: args.timeout.map(Duration::from_secs),
        cancel,
        ..SyncOptions::default()
    }
}

/// Cancels `cancel` on Ctrl+C. In-flight requests still finish and are reported.
fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight requests");
            cancel.cancel();
        }
    });
}

pub async fn sync_members(
    service: &DirectoryService,
    args: &SyncArgs,
    output: &OutputConfig,
) -> anyhow::Result<ExitCode> {
    let request: SyncRequest = build_request(args)?;
    let cancel: CancellationToken = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let span = progress::sync_span(request.group_ids.len());
    let counter = progress::outcome_counter(span.clone());

    let start_time: Instant = Instant::now();
    let run: SyncRun = service
        .sync_members(&request, build_options(args, cancel), Some(counter))
        .instrument(span)
        .await?;

    if let Some(err) = run.error {
        return Err(anyhow::Error::new(err).context("cannot resolve users, nothing was changed"));
    }

    if output.json {
        print::json(&run.report)?;
    } else {
        print_report(&run.report, run.user_ids.len(), start_time.elapsed(), output);
    }

    Ok(match run.report.is_clean() {
        true => ExitCode::SUCCESS,
        false => ExitCode::from(PARTIAL_EXIT),
    })
}

fn print_report(report: &SyncReport, users: usize, total_time: Duration, output: &OutputConfig) {
    if report.attempted() == 0 && report.aborted().is_none() {
        print::header("no users matched", output.quiet);
        print::no_results(output.quiet);
        return;
    }

    print::header("membership sync", output.quiet);
    for outcome in report.outcomes() {
        match (output.quiet, outcome.is_success()) {
            (2, true) => {}
            _ => print::print_status(format::outcome_line(outcome)),
        }
    }

    if output.quiet > 0 {
        mprint!();
    }
    print_summary(report, users, total_time, output);
}

fn print_summary(report: &SyncReport, users: usize, total_time: Duration, output: &OutputConfig) {
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    if output.quiet == 0 {
        print::fat_separator();
        print::set_key_width(&["users", "attempted", "succeeded", "failed", "stopped"]);
        print::aligned_line("users", users.to_string());
        print::aligned_line("attempted", report.attempted().to_string());
        print::aligned_line("succeeded", report.succeeded().to_string().green());
        print::aligned_line("failed", failed_count(report.failed()));
        if let Some(reason) = report.aborted() {
            print::aligned_line("stopped", abort_reason(reason));
        }
        mprint!();
    }

    let summary: String = format!(
        "{} of {} memberships applied in {}",
        report.succeeded().to_string().bold().green(),
        report.attempted().to_string().bold(),
        total_time
    );
    match (output.quiet, report.is_clean()) {
        (0, _) => print::centerln(&summary),
        (_, true) => success!("{}", summary),
        (_, false) => warn!("{}", summary),
    }
}

fn failed_count(failed: usize) -> ColoredString {
    match failed {
        0 => "0".color(colors::SEPARATOR),
        n => n.to_string().color(colors::FAILURE).bold(),
    }
}

fn abort_reason(reason: AbortReason) -> ColoredString {
    match reason {
        AbortReason::Unauthorized => "token rejected".color(colors::FAILURE),
        AbortReason::Cancelled => "cancelled or timed out".color(colors::ACCENT),
    }
}
