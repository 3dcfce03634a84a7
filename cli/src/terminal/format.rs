use colored::*;
use labsync_common::models::{AccessLevel, Group, Member, Project, User};
use labsync_core::report::SyncOutcome;

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

fn detail(key: &str, value: ColoredString) -> Detail {
    (key.to_string(), value)
}

/// Renders `value`, or a dimmed dash when it is empty.
fn or_dash(value: &str, color: Color) -> ColoredString {
    if value.is_empty() {
        "-".color(colors::SEPARATOR)
    } else {
        value.color(color)
    }
}

pub fn access_level(level: AccessLevel) -> ColoredString {
    format!("{} ({})", level.name(), level.value()).color(colors::ACCESS_LEVEL)
}

pub fn user_details(user: &User) -> Vec<Detail> {
    vec![
        detail("id", user.id.to_string().color(colors::ACCENT)),
        detail("name", or_dash(&user.display_name, colors::TEXT_DEFAULT)),
        detail("email", or_dash(&user.email, colors::SECONDARY)),
    ]
}

pub fn group_details(group: &Group) -> Vec<Detail> {
    vec![
        detail("id", group.id.to_string().color(colors::ACCENT)),
        detail("path", group.path.color(colors::SECONDARY)),
        detail("about", or_dash(&group.description, colors::TEXT_DEFAULT)),
    ]
}

pub fn project_details(projects: &[Project]) -> Vec<Detail> {
    projects
        .iter()
        .map(|project| {
            let key: String = format!("#{}", project.id);
            (key, project.name.color(colors::TEXT_DEFAULT))
        })
        .collect()
}

pub fn member_details(member: &Member) -> Vec<Detail> {
    vec![
        detail("id", member.id.to_string().color(colors::ACCENT)),
        detail("name", or_dash(&member.display_name, colors::TEXT_DEFAULT)),
        detail("role", access_level(member.access_level)),
    ]
}

/// One line per outcome: `group ← user  status`.
pub fn outcome_line(outcome: &SyncOutcome) -> String {
    let target: String = format!(
        "{} {} {}",
        outcome.group_id.as_str().color(colors::PRIMARY),
        "←".color(colors::SEPARATOR),
        outcome.user_id.to_string().color(colors::ACCENT)
    );

    let status: ColoredString = match (&outcome.error, outcome.already_satisfied) {
        (Some(err), _) => err.to_string().color(colors::FAILURE),
        (None, true) => "already satisfied".color(colors::SEPARATOR),
        (None, false) => format!("{} ok", outcome.action).green(),
    };
    format!("{} {}", target, status)
}
