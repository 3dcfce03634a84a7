use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use colored::*;
use indicatif::ProgressStyle;
use labsync_core::report::SyncOutcome;
use labsync_core::synchronizer::ProgressFn;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::terminal::colors;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ])
}

/// A span that renders as a spinner while a sync run is instrumented with it.
pub fn sync_span(groups: usize) -> Span {
    let span = info_span!("sync", indicatif.pb_show = true);
    span.pb_set_style(&spinner_style());
    span.pb_set_message(&format!(
        "Resolving users for {} groups...",
        groups.to_string().green().bold()
    ));
    span
}

/// Progress callback that counts outcomes on the spinner of `span`.
pub fn outcome_counter(span: Span) -> ProgressFn {
    let done: AtomicU64 = AtomicU64::new(0);
    Arc::new(move |outcome: &SyncOutcome| {
        span.pb_inc(1);
        let done: u64 = done.fetch_add(1, Ordering::Relaxed) + 1;
        let failed: ColoredString = if outcome.is_success() {
            "".normal()
        } else {
            " (last failed)".color(colors::FAILURE)
        };
        span.pb_set_message(&format!(
            "Processed {} memberships so far, last in {}{}",
            done.to_string().green().bold(),
            outcome.group_id.as_str().color(colors::PRIMARY),
            failed
        ));
    })
}
