pub mod groups;
pub mod members;
pub mod sync;
pub mod users;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use labsync_common::config::DEFAULT_CONFIG_PATH;
use labsync_common::models::AccessLevel;
use labsync_core::resolver::DEFAULT_MAX_RESULTS;

#[derive(Parser)]
#[command(name = "labsync")]
#[command(version, about = "Inspect GitLab users and groups and sync group membership in bulk.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the JSON config file (host, api_path, token)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Reduce output; repeat to print results only
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Upper bound on users resolved from a search
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List users, optionally filtered by a search pattern
    #[command(alias = "u")]
    Users {
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// List groups, or the projects of the given groups
    #[command(alias = "g")]
    Groups {
        /// Comma-separated group ids or paths
        #[arg(long)]
        ids: Option<String>,
    },
    /// List the members of a group
    #[command(alias = "t")]
    Team {
        #[arg(long)]
        id: Option<String>,
    },
    /// Add a user to a group
    NewMember {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        user: Option<String>,
        /// Role name (developer) or numeric value (30)
        #[arg(short, long)]
        access_level: AccessLevel,
    },
    /// Remove a user from a group
    DeleteMember {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Add (or remove) every user matching a search to each of the given groups
    #[command(alias = "sync")]
    SyncMembers(SyncArgs),
}

#[derive(Args)]
pub struct SyncArgs {
    /// Comma-separated group ids or paths
    #[arg(long)]
    pub ids: Option<String>,

    /// User search pattern; empty matches every user
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Role name (developer) or numeric value (30)
    #[arg(short, long, required_unless_present = "remove")]
    pub access_level: Option<AccessLevel>,

    /// Comma-separated user ids to use instead of a search
    #[arg(long)]
    pub users: Option<String>,

    /// Remove the users instead of adding them
    #[arg(long)]
    pub remove: bool,

    /// Concurrent requests per group
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub concurrency: u16,

    /// Stop issuing requests after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Keep going after the token is rejected
    #[arg(long)]
    pub no_fast_abort: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
