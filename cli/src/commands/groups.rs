use colored::*;
use labsync_common::config::OutputConfig;
use labsync_common::models::{Group, Project};
use labsync_common::request::{GroupId, parse_group_ids};
use labsync_core::service::DirectoryService;
use serde::Serialize;

use crate::mprint;
use crate::terminal::{colors, format, print};

/// Lists every group, or the projects of `ids` when given.
pub async fn groups(
    service: &DirectoryService,
    ids: Option<&str>,
    output: &OutputConfig,
) -> anyhow::Result<()> {
    match ids {
        Some(ids) => projects(service, ids, output).await,
        None => list(service, output).await,
    }
}

async fn list(service: &DirectoryService, output: &OutputConfig) -> anyhow::Result<()> {
    let groups: Vec<Group> = service.groups().await?;

    if output.json {
        return print::json(&groups);
    }
    if groups.is_empty() {
        print::header("no groups visible", output.quiet);
        print::no_results(output.quiet);
        return Ok(());
    }

    print::header("groups", output.quiet);
    for (idx, group) in groups.iter().enumerate() {
        match output.quiet {
            2 => print::print(&format!("{}\t{}", group.id, group.path)),
            _ => {
                print::tree_head(idx, &group.name);
                print::as_tree_one_level(format::group_details(group));
                if idx + 1 != groups.len() {
                    mprint!();
                }
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct GroupProjects<'a> {
    group_id: &'a GroupId,
    projects: &'a [Project],
}

async fn projects(
    service: &DirectoryService,
    ids: &str,
    output: &OutputConfig,
) -> anyhow::Result<()> {
    let group_ids: Vec<GroupId> = parse_group_ids(ids)?;
    let listed: Vec<(GroupId, Vec<Project>)> = service.group_projects(&group_ids).await?;

    if output.json {
        let rows: Vec<GroupProjects<'_>> = listed
            .iter()
            .map(|(group_id, projects)| GroupProjects { group_id, projects })
            .collect();
        return print::json(&rows);
    }

    print::header("group projects", output.quiet);
    for (idx, (group, projects)) in listed.iter().enumerate() {
        if output.quiet == 2 {
            for project in projects {
                print::print(&format!("{}\t{}\t{}", group, project.id, project.name));
            }
            continue;
        }

        print::tree_head(idx, group.as_str());
        if projects.is_empty() {
            let empty = "no projects".color(colors::SEPARATOR);
            print::print(&format!(" {} {}", "└─".bright_black(), empty));
        } else {
            print::as_tree_one_level(format::project_details(projects));
        }
        if idx + 1 != listed.len() {
            mprint!();
        }
    }
    Ok(())
}
