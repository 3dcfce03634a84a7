use colored::*;
use labsync_common::config::OutputConfig;
use labsync_common::models::User;
use labsync_core::service::DirectoryService;

use crate::mprint;
use crate::terminal::{colors, format, print};

pub async fn users(
    service: &DirectoryService,
    search: &str,
    output: &OutputConfig,
) -> anyhow::Result<()> {
    let users: Vec<User> = service.users(search).await?;

    if output.json {
        return print::json(&users);
    }
    if users.is_empty() {
        print::header("no users found", output.quiet);
        print::no_results(output.quiet);
        return Ok(());
    }

    print::header("users", output.quiet);
    for (idx, user) in users.iter().enumerate() {
        match output.quiet {
            2 => print::print(&format!("{}\t{}", user.id, user.username)),
            _ => {
                print::tree_head(idx, &user.username);
                print::as_tree_one_level(format::user_details(user));
                if idx + 1 != users.len() {
                    mprint!();
                }
            }
        }
    }

    if output.quiet < 2 {
        let count: ColoredString = format!("{} users", users.len()).bold().green();
        let query: ColoredString = match search {
            "" => "everyone".color(colors::SECONDARY),
            query => format!("'{query}'").color(colors::SECONDARY),
        };
        mprint!();
        print::print_status(format!("{count} matched {query}"));
    }
    Ok(())
}
