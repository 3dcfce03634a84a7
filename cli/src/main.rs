mod commands;
mod terminal;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use commands::{CommandLine, Commands, groups, members, sync, users};
use labsync_common::config::{Config, OutputConfig};
use labsync_core::service::DirectoryService;
use labsync_gitlab::GitLabClient;
use terminal::{logging, print};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let commands = CommandLine::parse_args();
    let output = OutputConfig {
        quiet: commands.quiet,
        json: commands.json,
    };

    logging::init_logging(&output)?;
    print::banner(&output);

    let config: Config = Config::load(&commands.config)
        .with_context(|| format!("cannot start without {}", commands.config.display()))?;
    debug!(?config, "configuration loaded");

    let client: GitLabClient = GitLabClient::new(&config)?;
    let service = DirectoryService::new(Arc::new(client), commands.max_results);

    let start_time: Instant = Instant::now();
    let code: ExitCode = match &commands.command {
        Commands::Users { search } => {
            users::users(&service, search, &output).await?;
            ExitCode::SUCCESS
        }
        Commands::Groups { ids } => {
            groups::groups(&service, ids.as_deref(), &output).await?;
            ExitCode::SUCCESS
        }
        Commands::Team { id } => {
            members::team(&service, id.as_deref(), &output).await?;
            ExitCode::SUCCESS
        }
        Commands::NewMember {
            id,
            user,
            access_level,
        } => {
            members::new_member(&service, id.as_deref(), user.as_deref(), *access_level).await?;
            ExitCode::SUCCESS
        }
        Commands::DeleteMember { id, user } => {
            members::delete_member(&service, id.as_deref(), user.as_deref()).await?;
            ExitCode::SUCCESS
        }
        Commands::SyncMembers(args) => {
            if !output.json {
                print::header("synchronizing memberships", output.quiet);
            }
            sync::sync_members(&service, args, &output).await?
        }
    };

    info!("{}", processed_in(start_time.elapsed()));
    if !output.json {
        print::end_of_program(output.quiet);
    }
    Ok(code)
}

fn processed_in(elapsed: Duration) -> String {
    format!(
        "processed in {}",
        format!("{:.2}s", elapsed.as_secs_f64()).yellow()
    )
}
