use labsync_common::config::OutputConfig;
use labsync_common::models::{AccessLevel, Member};
use labsync_common::request::{GroupId, parse_user_id};
use labsync_common::success;
use labsync_core::service::{DirectoryService, MemberChange};
use tracing::warn;

use crate::mprint;
use crate::terminal::{format, print};

fn group_arg(id: Option<&str>) -> anyhow::Result<Option<GroupId>> {
    Ok(id.map(str::parse).transpose()?)
}

fn user_arg(user: Option<&str>) -> anyhow::Result<Option<u64>> {
    Ok(user.map(parse_user_id).transpose()?)
}

pub async fn team(
    service: &DirectoryService,
    id: Option<&str>,
    output: &OutputConfig,
) -> anyhow::Result<()> {
    let group: Option<GroupId> = group_arg(id)?;
    let members: Vec<Member> = service.team(group.as_ref()).await?;

    if output.json {
        return print::json(&members);
    }
    if members.is_empty() {
        print::header("group has no members", output.quiet);
        print::no_results(output.quiet);
        return Ok(());
    }

    print::header("team", output.quiet);
    for (idx, member) in members.iter().enumerate() {
        match output.quiet {
            2 => print::print(&format!(
                "{}\t{}\t{}",
                member.id,
                member.username,
                member.access_level.value()
            )),
            _ => {
                print::tree_head(idx, &member.username);
                print::as_tree_one_level(format::member_details(member));
                if idx + 1 != members.len() {
                    mprint!();
                }
            }
        }
    }
    Ok(())
}

pub async fn new_member(
    service: &DirectoryService,
    id: Option<&str>,
    user: Option<&str>,
    access_level: AccessLevel,
) -> anyhow::Result<()> {
    let group: Option<GroupId> = group_arg(id)?;
    let user_id: Option<u64> = user_arg(user)?;

    match service.new_member(group.as_ref(), user_id, access_level).await? {
        MemberChange::Applied => success!(
            "user {} added with {}",
            user_id.unwrap_or_default(),
            format::access_level(access_level)
        ),
        MemberChange::AlreadySatisfied => warn!(
            user_id = user_id.unwrap_or_default(),
            "user is already a member, nothing changed"
        ),
    }
    Ok(())
}

pub async fn delete_member(
    service: &DirectoryService,
    id: Option<&str>,
    user: Option<&str>,
) -> anyhow::Result<()> {
    let group: Option<GroupId> = group_arg(id)?;
    let user_id: Option<u64> = user_arg(user)?;

    service.delete_member(group.as_ref(), user_id).await?;
    success!("user {} removed", user_id.unwrap_or_default());
    Ok(())
}
